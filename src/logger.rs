//! Logging setup for the `cms` binary.

use log::LevelFilter;

/// Initializes the global logger.
///
/// The level is `Info`, or `Debug` when `verbose`; `RUST_LOG` overrides both.
pub fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
