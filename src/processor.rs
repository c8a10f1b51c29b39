//! Generation of the static output tree.
//! Renders every page for every locale, copies localizable and static files,
//! and removes files a previous run produced that no longer have a source.

use crate::converter::ConverterRegistry;
use crate::error::{Error, Result};
use crate::renderer::process_page;
use crate::source::{CachedSource, Source};
use log::{debug, info, warn};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use walkdir::WalkDir;

static VERSIONED_REFERENCES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"(<script\s[^<>]*\bsrc="/[^"<>]+)"#).unwrap(),
        Regex::new(r#"(<link\s[^<>]*\bhref="/[^"<>]+)"#).unwrap(),
        Regex::new(r#"(<img\s[^<>]*\bsrc="/[^"<>]+)"#).unwrap(),
    ]
});

/// Counts of what a generation run did to the output directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    pub written: usize,
    pub unchanged: usize,
    pub removed_files: usize,
    pub removed_dirs: usize,
}

/// Appends `?{version}` to root-relative script, stylesheet and image references.
pub fn add_version(html: &str, version: &str) -> String {
    VERSIONED_REFERENCES.iter().fold(html.to_string(), |html, re| {
        re.replace_all(&html, |caps: &Captures| format!("{}?{}", &caps[1], version))
            .into_owned()
    })
}

/// Writes files below an output directory, remembering every path it was asked for.
#[derive(Debug)]
pub struct OutputWriter {
    output_dir: PathBuf,
    known_files: HashSet<PathBuf>,
    summary: GenerationSummary,
}

impl OutputWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            known_files: HashSet::new(),
            summary: GenerationSummary::default(),
        }
    }

    pub fn summary(&self) -> GenerationSummary {
        self.summary
    }

    pub fn is_known(&self, path: &Path) -> bool {
        self.known_files.contains(path)
    }

    /// Writes `contents` to the `/`-separated `path` below the output directory.
    ///
    /// A file that already has exactly these contents is left alone. A path
    /// written twice in one run keeps the first contents and logs a warning.
    pub fn write_file(&mut self, path: &str, contents: &[u8]) -> Result<()> {
        let outfile = path.split('/').fold(self.output_dir.clone(), |p, part| p.join(part));
        if !self.known_files.insert(outfile.clone()) {
            warn!("File {} has multiple sources", outfile.display());
            return Ok(());
        }

        if outfile.is_file() && fs::read(&outfile)? == contents {
            debug!("Unchanged: {}", outfile.display());
            self.summary.unchanged += 1;
            return Ok(());
        }

        if let Some(parent) = outfile.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&outfile, contents)?;
        debug!("Written: {}", outfile.display());
        self.summary.written += 1;
        Ok(())
    }

    /// Deletes every file below the output directory that was not written in
    /// this run, then every directory that ends up empty.
    pub fn remove_unknown(&mut self) -> Result<()> {
        if !self.output_dir.is_dir() {
            return Ok(());
        }

        for entry in WalkDir::new(&self.output_dir).min_depth(1).contents_first(true) {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_dir() {
                if fs::read_dir(path)?.next().is_none() {
                    fs::remove_dir(path)?;
                    debug!("Removed directory: {}", path.display());
                    self.summary.removed_dirs += 1;
                }
            } else if !self.known_files.contains(path) {
                fs::remove_file(path)?;
                debug!("Removed: {}", path.display());
                self.summary.removed_files += 1;
            }
        }
        Ok(())
    }
}

/// Generates the complete site from `source` into `output_dir`.
///
/// # Arguments
/// * `source` - Content tree; it is memoized and released when the run ends
/// * `registry` - Converters by format
/// * `output_dir` - Directory mirroring the produced site, created if missing
/// * `site_url_override` - Replaces `general.siteurl` for every page
///
/// # Returns
/// * `Result<GenerationSummary>` - What was written, kept and removed
///
/// # Errors
/// * `Error::UnknownFormat` if any page has a format without converter; checked
///   before anything is written
/// * Any page failing to render aborts the run before stale files are removed
///
/// # Output layout
/// * `{locale}/{page}` for every page available in `locale`
/// * `{locale}/{file}` for every localizable file
/// * `{file}` for every static file
pub fn generate_pages<S, P>(
    source: S,
    registry: &ConverterRegistry,
    output_dir: P,
    site_url_override: Option<&str>,
) -> Result<GenerationSummary>
where
    S: Source + 'static,
    P: AsRef<Path>,
{
    let source: Arc<dyn Source> = Arc::new(CachedSource::new(source));
    let version = source.version();
    let mut writer = OutputWriter::new(output_dir);

    let pages = source.list_pages()?;
    let locales = source.list_locales()?;

    // Pages without translations are never rendered, whatever their format
    for (page, format) in &pages {
        if registry.get(format).is_some() {
            continue;
        }
        for locale in &locales {
            if source.has_locale(locale, page)? {
                return Err(Error::UnknownFormat { page: page.clone(), format: format.clone() });
            }
        }
    }

    for (page, format) in pages {
        for locale in &locales {
            if !source.has_locale(locale, &page)? {
                continue;
            }
            let pagedata =
                process_page(&source, registry, locale, &page, &format, site_url_override)?;
            let pagedata = add_version(&pagedata, &version);
            writer.write_file(&format!("{locale}/{page}"), pagedata.as_bytes())?;
        }
    }

    for filename in source.list_localizable_files()? {
        for locale in &locales {
            if source.has_localizable_file(locale, &filename) {
                let filedata = source.read_localizable_file(locale, &filename)?;
                writer.write_file(&format!("{locale}/{filename}"), &filedata)?;
            }
        }
    }

    for filename in source.list_static()? {
        writer.write_file(&filename, &source.read_static(&filename)?)?;
    }

    writer.remove_unknown()?;

    let summary = writer.summary();
    info!(
        "Generated version {}: {} written, {} unchanged, {} removed",
        version, summary.written, summary.unchanged, summary.removed_files
    );
    Ok(summary)
}
