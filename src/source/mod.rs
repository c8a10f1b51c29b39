//! Read-only access to a content tree.
//!
//! A [`Source`] exposes pages, translation tables, localizable files,
//! templates, includes and static assets by logical path. Implementations only
//! provide the four primitives (`has_file`, `read_file`, `list_files` and
//! `version`); everything else is derived from them.

use crate::config::Settings;
use crate::constants::{
    INCLUDES_DIR, LOCALES_DIR, LOCALE_EXTENSION, PAGES_DIR, SETTINGS_FILE, STATIC_DIR,
    TEMPLATES_DIR, TEMPLATE_EXTENSION,
};
use crate::error::{Error, Result};
use crate::resolver;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub mod cached;
pub mod git;
pub mod local;

pub use cached::CachedSource;
pub use git::GitSource;
pub use local::LocalSource;

/// Localized strings of one logical file for one locale, keyed by string name.
pub type LocaleData = HashMap<String, String>;

/// A link rewritten to point at a specific locale variant of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub locale: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct LocaleEntry {
    message: String,
}

pub fn page_filename(page: &str, format: &str) -> String {
    format!("{PAGES_DIR}/{page}.{format}")
}

pub fn localizable_file_filename(locale: &str, filename: &str) -> String {
    format!("{LOCALES_DIR}/{locale}/{filename}")
}

pub fn locale_filename(locale: &str, page: &str) -> String {
    localizable_file_filename(locale, &format!("{page}.{LOCALE_EXTENSION}"))
}

pub fn static_filename(filename: &str) -> String {
    format!("{STATIC_DIR}/{filename}")
}

pub fn template_filename(template: &str) -> String {
    format!("{TEMPLATES_DIR}/{template}.{TEMPLATE_EXTENSION}")
}

pub fn include_filename(include: &str, format: &str) -> String {
    format!("{INCLUDES_DIR}/{include}.{format}")
}

/// Splits `name.ext` into `(name, ext)`, the extension lowercased.
/// Only the last path component is considered.
pub fn split_extension(filename: &str) -> (&str, String) {
    let basename_start = filename.rfind('/').map_or(0, |i| i + 1);
    match filename[basename_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = basename_start + dot;
            (&filename[..dot], filename[dot + 1..].to_lowercase())
        }
        _ => (filename, String::new()),
    }
}

/// Builds the translations of `page` for `locale`: the default locale's
/// entries, overridden by the entries `locale` defines itself.
pub fn layer_locale<S: Source + ?Sized>(
    source: &S,
    locale: &str,
    page: &str,
) -> Result<Arc<LocaleData>> {
    let settings = source.read_config()?;
    let default_locale = settings.default_locale()?;
    let mut result = if locale == default_locale {
        LocaleData::new()
    } else {
        source.read_locale(default_locale, page)?.as_ref().clone()
    };

    let filename = locale_filename(locale, settings.locale_file(page));
    if source.has_file(&filename) {
        let entries: IndexMap<String, LocaleEntry> =
            serde_json::from_str(&source.read_text(&filename)?)?;
        result.extend(entries.into_iter().map(|(key, entry)| (key, entry.message)));
    }
    Ok(Arc::new(result))
}

/// Uniform read access to a content tree.
///
/// The content is treated as immutable for as long as the source is open, so
/// callers may memoize any method (see [`CachedSource`]).
pub trait Source: Send + Sync {
    /// Returns whether a regular file exists at the logical path.
    fn has_file(&self, filename: &str) -> bool;

    /// Reads a file as bytes.
    ///
    /// # Errors
    /// * `Error::NotFound` if no file exists at the logical path
    fn read_file(&self, filename: &str) -> Result<Vec<u8>>;

    /// Lists all files below `subdir`, relative to it and `/`-separated.
    /// A missing directory yields an empty list.
    fn list_files(&self, subdir: &str) -> Result<Vec<String>>;

    /// Token identifying the state of the content, used for cache busting.
    fn version(&self) -> String;

    /// Reads a file as UTF-8 text.
    fn read_text(&self, filename: &str) -> Result<String> {
        let data = self.read_file(filename)?;
        String::from_utf8(data).map_err(|e| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{filename}: {e}"),
            ))
        })
    }

    fn read_config(&self) -> Result<Arc<Settings>> {
        Ok(Arc::new(Settings::parse(&self.read_text(SETTINGS_FILE)?)?))
    }

    /// Lists all pages as `(page, format)` pairs.
    fn list_pages(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .list_files(PAGES_DIR)?
            .iter()
            .map(|filename| {
                let (root, format) = split_extension(filename);
                (root.to_string(), format)
            })
            .collect())
    }

    fn has_page(&self, page: &str, format: &str) -> bool {
        self.has_file(&page_filename(page, format))
    }

    fn read_page(&self, page: &str, format: &str) -> Result<String> {
        self.read_text(&page_filename(page, format))
    }

    /// Lists the localizable files, taking the default locale as the canonical list.
    fn list_localizable_files(&self) -> Result<Vec<String>> {
        let settings = self.read_config()?;
        let dir = format!("{LOCALES_DIR}/{}", settings.default_locale()?);
        Ok(self
            .list_files(&dir)?
            .into_iter()
            .filter(|filename| split_extension(filename).1 != LOCALE_EXTENSION)
            .collect())
    }

    fn has_localizable_file(&self, locale: &str, filename: &str) -> bool {
        self.has_file(&localizable_file_filename(locale, filename))
    }

    fn read_localizable_file(&self, locale: &str, filename: &str) -> Result<Vec<u8>> {
        self.read_file(&localizable_file_filename(locale, filename))
    }

    fn list_static(&self) -> Result<Vec<String>> {
        self.list_files(STATIC_DIR)
    }

    fn has_static(&self, filename: &str) -> bool {
        self.has_file(&static_filename(filename))
    }

    fn read_static(&self, filename: &str) -> Result<Vec<u8>> {
        self.read_file(&static_filename(filename))
    }

    /// Lists all locales, sorted.
    fn list_locales(&self) -> Result<Vec<String>> {
        let locales: BTreeSet<String> = self
            .list_files(LOCALES_DIR)?
            .into_iter()
            .filter_map(|filename| {
                filename.split_once('/').map(|(locale, _)| locale.to_string())
            })
            .collect();
        Ok(locales.into_iter().collect())
    }

    /// Returns whether `locale` has a translation file for `page`,
    /// following `locale_overrides`.
    fn has_locale(&self, locale: &str, page: &str) -> Result<bool> {
        let settings = self.read_config()?;
        Ok(self.has_file(&locale_filename(locale, settings.locale_file(page))))
    }

    /// Reads the translations for `page`, layering `locale` over the default locale.
    fn read_locale(&self, locale: &str, page: &str) -> Result<Arc<LocaleData>> {
        layer_locale(self, locale, page)
    }

    fn read_template(&self, template: &str) -> Result<String> {
        self.read_text(&template_filename(template))
    }

    fn has_include(&self, include: &str, format: &str) -> bool {
        self.has_file(&include_filename(include, format))
    }

    fn read_include(&self, include: &str, format: &str) -> Result<String> {
        self.read_text(&include_filename(include, format))
    }

    /// Resolves a same-site link to the locale variant it should point at.
    /// See [`resolver::resolve_link`].
    fn resolve_link(&self, url: &str, locale: &str) -> Result<Option<ResolvedLink>> {
        resolver::resolve_link(self, url, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("index.md"), ("index", "md".to_string()));
        assert_eq!(split_extension("sub/page.TMPL"), ("sub/page", "tmpl".to_string()));
        assert_eq!(split_extension("a.b/noext"), ("a.b/noext", String::new()));
        assert_eq!(split_extension(".hidden"), (".hidden", String::new()));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(page_filename("about/team", "md"), "pages/about/team.md");
        assert_eq!(locale_filename("de", "index"), "locales/de/index.json");
        assert_eq!(template_filename("default"), "templates/default.tmpl");
        assert_eq!(include_filename("footer", "raw"), "includes/footer.raw");
        assert_eq!(static_filename("css/main.css"), "static/css/main.css");
    }
}
