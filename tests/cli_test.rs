use clap::Parser;
use cms::cli::Args;
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("cms")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_basic_args() {
    let args = make_args(&["./content", "./output"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.source, PathBuf::from("./content"));
    assert_eq!(parsed.output_dir, PathBuf::from("./output"));
    assert_eq!(parsed.rev, "HEAD");
    assert!(!parsed.live);
    assert!(parsed.site_url.is_none());
    assert!(!parsed.verbose);
}

#[test]
fn test_all_flags() {
    let args = make_args(&[
        "--rev",
        "release-1",
        "--live",
        "--site-url",
        "http://localhost:8000",
        "--verbose",
        "./content",
        "./output",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.rev, "release-1");
    assert!(parsed.live);
    assert_eq!(parsed.site_url.as_deref(), Some("http://localhost:8000"));
    assert!(parsed.verbose);
}

#[test]
fn test_short_flags() {
    let args = make_args(&["-r", "abc123", "-v", "./content", "./output"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.rev, "abc123");
    assert!(parsed.verbose);
}

#[test]
fn test_missing_args() {
    let args = make_args(&["./content"]);
    assert!(Args::try_parse_from(args).is_err());
}

#[test]
fn test_too_many_args() {
    let args = make_args(&["./content", "./output", "extra"]);
    assert!(Args::try_parse_from(args).is_err());
}
