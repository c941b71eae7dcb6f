//! Directory-backed file store
//!
//! Serves regular files found under a root directory.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use super::{FileHandle, FileStore};
use crate::error::Result;

/// Resolves requested names relative to a root directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Serve files from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a requested name to a path under the root
    ///
    /// Absolute paths and `..` components never resolve.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let requested = Path::new(name);
        let mut path = self.root.clone();

        for component in requested.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return None;
                }
            }
        }

        if path == self.root {
            return None;
        }
        Some(path)
    }
}

impl FileStore for DirectoryStore {
    fn open(&self, name: &str) -> Result<Option<FileHandle>> {
        let Some(path) = self.resolve(name) else {
            tracing::warn!("Refusing to resolve '{}' outside {}", name, self.root.display());
            return Ok(None);
        };

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("Cannot open {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        // Directories open fine on unix but can't be streamed
        match file.metadata() {
            Ok(meta) if meta.is_file() => Ok(Some(FileHandle::new(name, file))),
            Ok(_) => {
                tracing::debug!("{} is not a regular file", path.display());
                Ok(None)
            }
            Err(e) => {
                tracing::debug!("Cannot stat {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }
}
