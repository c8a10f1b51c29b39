//! Snapshot source over a git revision.
//! The whole tree of the requested commit is loaded into memory when the source
//! is opened, so later changes to the repository do not affect a running generation.

use crate::error::{Error, Result};
use crate::source::Source;
use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

/// Immutable, in-memory archive of one repository revision.
#[derive(Debug)]
pub struct GitSource {
    files: BTreeMap<String, Vec<u8>>,
    version: String,
}

impl GitSource {
    /// Opens `repo` and archives the tree of `rev`.
    ///
    /// # Arguments
    /// * `repo` - Path to the repository (working tree or bare)
    /// * `rev` - Any revision expression git understands (`HEAD`, a branch, a hash)
    ///
    /// # Errors
    /// * `Error::Git2Error` if the repository cannot be opened, the revision does
    ///   not resolve to a commit, or an object cannot be read
    pub fn open<P: AsRef<Path>>(repo: P, rev: &str) -> Result<Self> {
        let repo = repo.as_ref();
        debug!("Archiving revision '{}' of '{}'.", rev, repo.display());

        let repository = Repository::open(repo)?;
        let commit = repository.revparse_single(rev)?.peel_to_commit()?;
        let tree = commit.tree()?;

        let mut files = BTreeMap::new();
        let mut failure: Option<git2::Error> = None;
        let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() != Some(ObjectType::Blob) {
                return TreeWalkResult::Ok;
            }
            let Some(name) = entry.name() else {
                return TreeWalkResult::Ok;
            };
            match repository.find_blob(entry.id()) {
                Ok(blob) => {
                    files.insert(format!("{root}{name}"), blob.content().to_vec());
                    TreeWalkResult::Ok
                }
                Err(e) => {
                    failure = Some(e);
                    TreeWalkResult::Abort
                }
            }
        });
        if let Some(e) = failure {
            return Err(Error::Git2Error(e));
        }
        walked?;

        let version = commit
            .as_object()
            .short_id()?
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| commit.id().to_string());

        debug!("Archived {} file(s) at version {}.", files.len(), version);
        Ok(Self { files, version })
    }

    /// Releases the in-memory archive.
    pub fn close(self) {}
}

impl Source for GitSource {
    fn has_file(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    fn read_file(&self, filename: &str) -> Result<Vec<u8>> {
        self.files
            .get(filename)
            .cloned()
            .ok_or_else(|| Error::NotFound { path: filename.to_string() })
    }

    fn list_files(&self, subdir: &str) -> Result<Vec<String>> {
        let prefix = format!("{subdir}/");
        Ok(self
            .files
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .map(|(name, _)| name[prefix.len()..].to_string())
            .collect())
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}
