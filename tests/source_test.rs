mod common;

use cms::error::Error;
use cms::source::{GitSource, LocalSource, ResolvedLink, Source};
use common::{commit_all, content_tree, write_tree, SITE};
use std::fs;

fn link(locale: &str, url: &str) -> Option<ResolvedLink> {
    Some(ResolvedLink { locale: locale.to_string(), url: url.to_string() })
}

#[test]
fn test_read_locale_falls_back_to_default() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    let de = source.read_locale("de", "index").unwrap();
    assert_eq!(de["user"], "Welt");
    assert_eq!(de["title"], "Home");

    let en = source.read_locale("en", "index").unwrap();
    assert_eq!(en["user"], "World");
}

#[test]
fn test_read_locale_without_any_file_is_empty() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();
    assert!(source.read_locale("de", "missing").unwrap().is_empty());
}

#[test]
fn test_locale_overrides_apply_to_lookup_and_existence() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert!(source.has_locale("de", "index-b").unwrap());
    assert_eq!(source.read_locale("de", "index-b").unwrap()["user"], "Welt");
    assert!(!source.has_locale("de", "about").unwrap());
}

#[test]
fn test_listings() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert_eq!(source.list_locales().unwrap(), vec!["de", "en"]);
    assert_eq!(
        source.list_pages().unwrap(),
        vec![
            ("about".to_string(), "md".to_string()),
            ("docs/intro".to_string(), "tmpl".to_string()),
            ("index-b".to_string(), "raw".to_string()),
            ("index".to_string(), "raw".to_string()),
        ]
    );
    assert_eq!(
        source.list_localizable_files().unwrap(),
        vec!["download.pdf", "images/logo.png"]
    );
    assert_eq!(source.list_static().unwrap(), vec!["css/main.css"]);
    assert!(source.list_files("filters").unwrap().is_empty());
}

#[test]
fn test_typed_reads() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert!(source.has_page("about", "md"));
    assert!(!source.has_page("about", "raw"));
    assert!(source.has_include("footer", "raw"));
    assert_eq!(source.read_include("footer", "raw").unwrap(), "<footer>$user$</footer>");
    assert!(source.has_static("css/main.css"));
    assert_eq!(source.read_static("css/main.css").unwrap(), b"body { color: black; }");
    assert_eq!(source.read_localizable_file("de", "images/logo.png").unwrap(), b"de-logo");
    assert!(source.read_template("default").unwrap().contains("available_locales"));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    match source.read_page("nope", "raw") {
        Err(Error::NotFound { path }) => assert_eq!(path, "pages/nope.raw"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_local_source_requires_directory() {
    let dir = content_tree(SITE);
    assert!(LocalSource::new(dir.path().join("nothing-here")).is_err());
}

#[test]
fn test_resolve_link_prefers_requested_locale() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert_eq!(source.resolve_link("docs/intro", "de").unwrap(), link("de", "/de/docs/intro"));
    assert_eq!(source.resolve_link("docs/intro", "en").unwrap(), link("en", "/en/docs/intro"));
}

#[test]
fn test_resolve_link_falls_back_to_default_locale() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert_eq!(source.resolve_link("about", "de").unwrap(), link("en", "/en/about"));
    assert_eq!(source.resolve_link("download.pdf", "de").unwrap(), link("en", "/en/download.pdf"));
    assert_eq!(
        source.resolve_link("images/logo.png", "de").unwrap(),
        link("de", "/de/images/logo.png")
    );
}

#[test]
fn test_resolve_link_default_page_and_components() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    assert_eq!(source.resolve_link("index", "de").unwrap(), link("de", "/de/"));
    assert_eq!(
        source.resolve_link("about?x=1#team", "en").unwrap(),
        link("en", "/en/about?x=1#team")
    );
    // Redirected pages follow the locale file they share
    assert_eq!(source.resolve_link("index-b", "de").unwrap(), link("de", "/de/index-b"));
}

#[test]
fn test_resolve_link_ignores_non_page_links() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();

    for url in ["https://example.com/about", "mailto:a@b.c", "/en/about", "./about", "../x", "#top", "?q=1", ""] {
        assert_eq!(source.resolve_link(url, "de").unwrap(), None, "{url}");
    }
}

#[test]
fn test_resolve_link_unknown_target_keeps_locale() {
    let dir = content_tree(SITE);
    let source = LocalSource::new(dir.path()).unwrap();
    assert_eq!(source.resolve_link("unknown", "de").unwrap(), link("de", "/de/unknown"));
}

#[test]
fn test_git_source_serves_committed_revision() {
    let dir = content_tree(SITE);
    let version = commit_all(dir.path(), "initial");

    // Uncommitted changes are not part of the snapshot
    write_tree(dir.path(), &[("pages/draft.raw", "draft")]);
    fs::write(dir.path().join("static/css/main.css"), "changed").unwrap();

    let source = GitSource::open(dir.path(), "HEAD").unwrap();
    assert_eq!(source.version(), version);
    assert!(!source.has_page("draft", "raw"));
    assert_eq!(source.read_static("css/main.css").unwrap(), b"body { color: black; }");
    assert_eq!(source.read_locale("de", "index").unwrap()["title"], "Home");
    assert_eq!(source.list_locales().unwrap(), vec!["de", "en"]);
    assert_eq!(source.list_localizable_files().unwrap(), vec!["download.pdf", "images/logo.png"]);
    assert!(matches!(source.read_page("draft", "raw"), Err(Error::NotFound { .. })));
    source.close();
}

#[test]
fn test_git_source_reads_older_revisions() {
    let dir = content_tree(SITE);
    commit_all(dir.path(), "initial");
    fs::remove_file(dir.path().join("pages/about.md")).unwrap();
    let second = commit_all(dir.path(), "remove about");

    let head = GitSource::open(dir.path(), "HEAD").unwrap();
    assert_eq!(head.version(), second);
    assert!(!head.has_page("about", "md"));

    let previous = GitSource::open(dir.path(), "HEAD~1").unwrap();
    assert!(previous.has_page("about", "md"));
}

#[test]
fn test_git_source_open_failure() {
    let dir = content_tree(SITE);
    assert!(matches!(GitSource::open(dir.path(), "HEAD"), Err(Error::Git2Error(_))));

    commit_all(dir.path(), "initial");
    assert!(GitSource::open(dir.path(), "no-such-branch").is_err());
}
