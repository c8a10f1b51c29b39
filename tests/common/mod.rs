#![allow(dead_code)]

use git2::{IndexAddOption, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const SETTINGS: &str = "[general]
defaultlocale = en
defaultpage = index
siteurl = https://example.com

[locale_overrides]
index-b = index
";

/// A small two-locale site.
pub const SITE: &[(&str, &str)] = &[
    ("settings.ini", SETTINGS),
    ("pages/index.raw", "<head><link rel=\"stylesheet\" href=\"/css/main.css\"></head>\n<h1>$title$</h1>\n<p>Hello $user$</p>\n<? include footer ?>"),
    ("pages/index-b.raw", "<p>$user$</p>"),
    ("pages/about.md", "title = About us\n# $title$ {#top}\n\n[Home](index)\n"),
    ("pages/docs/intro.tmpl", "<p>{{ \"intro\"|translate }}</p>"),
    ("locales/en/index.json", r#"{"title": {"message": "Home"}, "user": {"message": "World"}}"#),
    ("locales/de/index.json", r#"{"user": {"message": "Welt"}}"#),
    ("locales/en/about.json", r#"{"title": {"message": "About"}}"#),
    ("locales/en/docs/intro.json", r#"{"intro": {"message": "Introduction"}}"#),
    ("locales/de/docs/intro.json", r#"{"intro": {"message": "Einleitung"}}"#),
    ("locales/en/images/logo.png", "en-logo"),
    ("locales/de/images/logo.png", "de-logo"),
    ("locales/en/download.pdf", "en-pdf"),
    ("templates/default.tmpl", "<!DOCTYPE html>\n<html lang=\"{{ locale }}\"><head>{{ head }}<title>{{ title }}</title></head><body>{{ body }}<ul>{% for l in available_locales %}<li>{{ l }}</li>{% endfor %}</ul></body></html>"),
    ("includes/footer.raw", "<footer>$user$</footer>"),
    ("static/css/main.css", "body { color: black; }"),
];

pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Creates a directory holding `files`.
pub fn content_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_tree(dir.path(), files);
    dir
}

/// Commits the whole working tree of `root`, creating the repository if needed.
/// Returns the abbreviated id of the new commit.
pub fn commit_all(root: &Path, message: &str) -> String {
    let repo = Repository::open(root).or_else(|_| Repository::init(root)).unwrap();
    let mut index = repo.index().unwrap();
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Test", "test@example.com").unwrap();

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    let id = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents).unwrap();

    let object = repo.find_object(id, None).unwrap();
    let short_id = object.short_id().unwrap();
    short_id.as_str().unwrap().to_string()
}
