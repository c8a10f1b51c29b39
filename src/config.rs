//! Site settings handling.
//! This module parses the `settings.ini` file found at the root of a content tree
//! and provides typed accessors for the options the generator relies on.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

pub const GENERAL_SECTION: &str = "general";
pub const LOCALE_OVERRIDES_SECTION: &str = "locale_overrides";

/// Parsed contents of `settings.ini`.
///
/// Sections keep their file order. Option names are case-insensitive and
/// stored lowercase, section names are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl Settings {
    /// Parses INI content.
    ///
    /// # Arguments
    /// * `content` - Raw settings file content
    ///
    /// # Returns
    /// * `Result<Settings>` - Parsed settings
    ///
    /// # Errors
    /// * `Error::ConfigError` if an option appears outside of a section or a
    ///   line is neither a header, an option nor a comment
    pub fn parse(content: &str) -> Result<Self> {
        let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Indented lines continue the previous value
            if line.starts_with(char::is_whitespace) {
                if let (Some(section), Some(key)) = (&current, &last_key) {
                    if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                last_key = None;
                continue;
            }

            let Some(split_at) = trimmed.find(['=', ':']) else {
                return Err(Error::ConfigError(format!(
                    "invalid line {} in settings: '{}'",
                    index + 1,
                    trimmed
                )));
            };
            let Some(section) = &current else {
                return Err(Error::ConfigError(format!(
                    "option on line {} appears before any section header",
                    index + 1
                )));
            };

            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();
            sections.entry(section.clone()).or_default().insert(key.clone(), value);
            last_key = Some(key);
        }

        debug!("Parsed settings with {} section(s)", sections.len());
        Ok(Self { sections })
    }

    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|options| options.get(&option.to_lowercase()))
            .map(String::as_str)
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.get(section, option).is_some()
    }

    /// Returns all sections in file order.
    pub fn sections(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.sections
    }

    fn require(&self, section: &str, option: &str) -> Result<&str> {
        self.get(section, option).ok_or_else(|| {
            Error::ConfigError(format!("missing option '{option}' in section [{section}]"))
        })
    }

    /// Locale every page must exist in (`general.defaultlocale`).
    pub fn default_locale(&self) -> Result<&str> {
        self.require(GENERAL_SECTION, "defaultlocale")
    }

    /// Page served at the site root (`general.defaultpage`).
    pub fn default_page(&self) -> Result<&str> {
        self.require(GENERAL_SECTION, "defaultpage")
    }

    pub fn site_url(&self) -> Option<&str> {
        self.get(GENERAL_SECTION, "siteurl")
    }

    /// Returns the logical file `page` takes its translations from, if redirected.
    pub fn locale_override(&self, page: &str) -> Option<&str> {
        self.get(LOCALE_OVERRIDES_SECTION, page)
    }

    /// Returns the logical file holding translations for `page`.
    pub fn locale_file<'a>(&'a self, page: &'a str) -> &'a str {
        self.locale_override(page).unwrap_or(page)
    }
}
