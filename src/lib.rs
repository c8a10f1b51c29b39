//! cms is a static site generator for localized, versioned websites.
//! It reads a content tree of pages, translations, templates and includes
//! (from a git revision or a working directory) and writes one HTML file per
//! page and locale, keeping the output directory an exact mirror of the content.

/// Command-line interface module
pub mod cli;

/// Parsing of the content tree's settings.ini
pub mod config;

/// Names of the directories and files making up a content tree
pub mod constants;

/// Raw, markdown and template converters, and the steps they share:
/// localized strings, links, includes
pub mod converter;

/// Error types and handling
pub mod error;

/// Logger initialization for the binary
pub mod logger;

/// Output tree generation: writing, versioning and pruning
pub mod processor;

/// Page rendering into the page template
pub mod renderer;

/// Locale selection for intra-site links
pub mod resolver;

/// Content tree access: git snapshots and working directories
pub mod source;
