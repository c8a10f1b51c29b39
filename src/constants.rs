//! Common constants describing the content tree layout.

/// Settings file at the root of every content tree
pub const SETTINGS_FILE: &str = "settings.ini";

pub const PAGES_DIR: &str = "pages";
pub const LOCALES_DIR: &str = "locales";
pub const TEMPLATES_DIR: &str = "templates";
pub const INCLUDES_DIR: &str = "includes";
pub const STATIC_DIR: &str = "static";
pub const FILTERS_DIR: &str = "filters";

/// Extension of translation files inside `locales/<locale>/`
pub const LOCALE_EXTENSION: &str = "json";

/// Extension of outer page templates and filter extensions
pub const TEMPLATE_EXTENSION: &str = "tmpl";

/// Page template used when a page does not name one
pub const DEFAULT_TEMPLATE: &str = "default";

/// Nested includes deeper than this are treated as a cycle
pub const MAX_INCLUDE_DEPTH: usize = 8;
