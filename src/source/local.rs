//! Live source reading straight from a working directory.

use crate::error::{Error, Result};
use crate::source::Source;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// Source backed by a directory on disk.
///
/// Every call goes to the filesystem, so edits show up immediately.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    /// Creates a new LocalSource instance.
    ///
    /// # Errors
    /// * `Error::NotFound` if `root` is not a directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::NotFound { path: root.display().to_string() });
        }
        debug!("Reading content from '{}'.", root.display());
        Ok(Self { root: root.to_path_buf() })
    }

    /// Releases the source. Nothing is held open between calls.
    pub fn close(self) {}

    fn get_path(&self, filename: &str) -> PathBuf {
        filename.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl Source for LocalSource {
    fn has_file(&self, filename: &str) -> bool {
        self.get_path(filename).is_file()
    }

    fn read_file(&self, filename: &str) -> Result<Vec<u8>> {
        fs::read(self.get_path(filename)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound { path: filename.to_string() },
            _ => Error::IoError(e),
        })
    }

    fn list_files(&self, subdir: &str) -> Result<Vec<String>> {
        let dir = self.get_path(subdir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&dir).map_err(|e| {
                Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            result.push(parts.join("/"));
        }
        Ok(result)
    }

    /// The working directory has no revision, so the version is the current time.
    fn version(&self) -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            .to_string()
    }
}
