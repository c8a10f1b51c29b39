//! Entry point: generates a site from a content repository.

use std::sync::Arc;

use cms::{
    cli::{get_args, Args},
    converter::{ConverterRegistry, TemplateFilterProvider},
    error::{default_error_handler, Result},
    logger::init_logger,
    processor::generate_pages,
    source::{GitSource, LocalSource},
};
use log::info;

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Sets up the converters for raw, markdown and template pages
/// 2. Opens the source: a snapshot of `--rev`, or the directory with `--live`
/// 3. Generates the site and prunes stale output
fn run(args: Args) -> Result<()> {
    let registry = ConverterRegistry::with_defaults(Arc::new(TemplateFilterProvider::new()));
    let site_url = args.site_url.as_deref();

    let summary = if args.live {
        generate_pages(LocalSource::new(&args.source)?, &registry, &args.output_dir, site_url)?
    } else {
        let source = GitSource::open(&args.source, &args.rev)?;
        generate_pages(source, &registry, &args.output_dir, site_url)?
    };

    info!(
        "Site generated in {} ({} written, {} unchanged, {} removed).",
        args.output_dir.display(),
        summary.written,
        summary.unchanged,
        summary.removed_files
    );
    Ok(())
}
