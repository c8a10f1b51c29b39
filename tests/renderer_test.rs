mod common;

use cms::converter::filters::NoFilters;
use cms::converter::ConverterRegistry;
use cms::error::Error;
use cms::renderer::process_page;
use cms::source::{LocalSource, Source};
use common::{content_tree, write_tree, SITE};
use std::sync::Arc;
use tempfile::TempDir;

fn render(dir: &TempDir, locale: &str, page: &str, format: &str) -> Result<String, Error> {
    render_with_site_url(dir, locale, page, format, None)
}

fn render_with_site_url(
    dir: &TempDir,
    locale: &str,
    page: &str,
    format: &str,
    site_url: Option<&str>,
) -> Result<String, Error> {
    let source: Arc<dyn Source> = Arc::new(LocalSource::new(dir.path()).unwrap());
    let registry = ConverterRegistry::with_defaults(Arc::new(NoFilters));
    process_page(&source, &registry, locale, page, format, site_url)
}

#[test]
fn test_page_in_default_template() {
    let dir = content_tree(SITE);

    assert_eq!(
        render(&dir, "en", "index", "raw").unwrap(),
        "<!DOCTYPE html>\n<html lang=\"en\"><head><link rel=\"stylesheet\" href=\"/css/main.css\"><title>title</title></head><body>\n<h1>Home</h1>\n<p>Hello World</p>\n<footer>World</footer><ul><li>de</li><li>en</li></ul></body></html>"
    );
}

#[test]
fn test_page_in_other_locale_falls_back_per_string() {
    let dir = content_tree(SITE);

    let html = render(&dir, "de", "index", "raw").unwrap();
    assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"de\">"));
    assert!(html.contains("<h1>Home</h1>\n<p>Hello Welt</p>\n<footer>Welt</footer>"));
}

#[test]
fn test_markdown_page_with_title_header() {
    let dir = content_tree(SITE);

    assert_eq!(
        render(&dir, "en", "about", "md").unwrap(),
        "<!DOCTYPE html>\n<html lang=\"en\"><head><title>About us</title></head><body><h1 id=\"top\">About</h1>\n<p><a href=\"/en/\" hreflang=\"en\">Home</a></p>\n<ul><li>en</li></ul></body></html>"
    );
}

#[test]
fn test_template_page() {
    let dir = content_tree(SITE);

    let html = render(&dir, "de", "docs/intro", "tmpl").unwrap();
    assert!(html.contains("<body><p>Einleitung</p><ul><li>de</li><li>en</li></ul></body>"));
}

#[test]
fn test_unknown_format_fails_before_reading() {
    let dir = content_tree(SITE);

    match render(&dir, "en", "does-not-exist", "xyz") {
        Err(Error::UnknownFormat { page, format }) => {
            assert_eq!(page, "does-not-exist");
            assert_eq!(format, "xyz");
        }
        other => panic!("Expected UnknownFormat, got {other:?}"),
    }
}

#[test]
fn test_header_selects_template_and_site_url() {
    let dir = content_tree(SITE);
    write_tree(
        dir.path(),
        &[
            ("pages/plain.raw", "template = plain\nfoo = bar\n<p>x</p>"),
            ("templates/plain.tmpl", "[{{ body }}|{{ template }}|{{ foo }}|{{ site_url }}]"),
        ],
    );

    assert_eq!(
        render(&dir, "en", "plain", "raw").unwrap(),
        "[<p>x</p>|plain|bar|https://example.com]"
    );
    assert_eq!(
        render_with_site_url(&dir, "en", "plain", "raw", Some("http://localhost:8000")).unwrap(),
        "[<p>x</p>|plain|bar|http://localhost:8000]"
    );
}

#[test]
fn test_site_url_absent_without_setting() {
    let dir = content_tree(SITE);
    write_tree(
        dir.path(),
        &[
            ("settings.ini", "[general]\ndefaultlocale = en\ndefaultpage = index\n"),
            ("pages/plain.raw", "template = plain\n<p>x</p>"),
            ("templates/plain.tmpl", "{% if site_url is defined %}{{ site_url }}{% else %}none{% endif %}"),
        ],
    );

    assert_eq!(
        render_with_site_url(&dir, "en", "plain", "raw", Some("http://localhost:8000")).unwrap(),
        "none"
    );
}

#[test]
fn test_missing_template_fails() {
    let dir = content_tree(SITE);
    write_tree(dir.path(), &[("pages/plain.raw", "template = nothing\n<p>x</p>")]);

    match render(&dir, "en", "plain", "raw") {
        Err(Error::NotFound { path }) => assert_eq!(path, "templates/nothing.tmpl"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
}
