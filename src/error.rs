//! Error handling for the site generator.
//! Defines the error taxonomy and the result alias used throughout the crate.

use thiserror::Error;

/// Errors raised while reading a content tree or generating pages.
///
/// Every variant is fatal for a generation run. Non-fatal conditions
/// (unresolvable links, duplicate output paths) are only logged.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    /// Represents failures to open or read a git snapshot
    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    #[error("Walkdir error: {0}.")]
    WalkdirError(#[from] walkdir::Error),

    #[error("JSON error: {0}.")]
    JSONParseError(#[from] serde_json::Error),

    /// Represents errors raised by the template engine while rendering
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A logical path requested from a source does not exist
    #[error("File '{path}' does not exist in the source.")]
    NotFound { path: String },

    /// Represents errors that occur while parsing or querying settings
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Lookup failed for string {name} used on page {page}.")]
    LocalizationError { name: String, page: String },

    #[error("Failed to resolve include {name} in page {page}.")]
    UnresolvedInclude { name: String, page: String },

    #[error("Include {name} in page {page} exceeds the maximum include depth of {depth}.")]
    IncludeCycle { name: String, page: String, depth: usize },

    #[error("Page {page} uses unknown format {format}.")]
    UnknownFormat { page: String, format: String },

    /// Represents missing or broken template filter extensions
    #[error("Filter error: {0}.")]
    FilterError(String),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
