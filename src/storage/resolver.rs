//! Name-to-path resolution under the managed root

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::debug;
use tempfile::Builder;

use crate::error::PersistError;
use crate::storage::StoredLocation;

/// Extension appended to every stored dataset
pub const DATASET_EXTENSION: &str = "csv";

/// Longest accepted dataset name, in bytes
pub const MAX_NAME_LEN: usize = 200;

/// Prefix of in-flight temp files; resolved names never start with '.'
pub const TEMP_PREFIX: &str = ".upload-";

/// Maps dataset names onto files inside a single managed directory.
///
/// Every path handed to a storage backend comes out of [`StorageResolver::resolve`].
#[derive(Debug, Clone)]
pub struct StorageResolver {
    root: PathBuf,
}

impl StorageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the managed root (and parents) if absent.
    ///
    /// Idempotent and safe to race with other callers. Fails when the path is
    /// taken by something that is not a directory, or the process cannot
    /// create files inside it.
    pub fn ensure_root(&self) -> Result<(), PersistError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                PersistError::storage_unavailable(&self.root, "path exists and is not a directory")
            } else {
                PersistError::storage_unavailable(&self.root, e)
            }
        })?;

        let metadata = fs::metadata(&self.root)
            .map_err(|e| PersistError::storage_unavailable(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(PersistError::storage_unavailable(&self.root, "path exists and is not a directory"));
        }

        // Permission bits alone miss roots owned by another user; try a real file
        Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| PersistError::storage_unavailable(&self.root, format!("directory is not writable: {}", e)))?;

        debug!("Storage root ready: {}", self.root.display());
        Ok(())
    }

    /// Validate `name` and map it to `<root>/<name>.csv`. No I/O.
    pub fn resolve(&self, name: &str) -> Result<StoredLocation, PersistError> {
        validate_name(name)?;

        let file_name = format!("{}.{}", name, DATASET_EXTENSION);
        let mut components = Path::new(&file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(PersistError::invalid_name(name, "would escape the storage root")),
        }

        let path = self.root.join(&file_name);
        debug!("Resolved dataset {:?} to {}", name, path.display());
        Ok(StoredLocation {
            name: name.to_string(),
            file_name,
            path,
        })
    }
}

/// Reject anything that could leave the root or alias another name.
///
/// `..` inside a name is harmless once separators are gone; only the bare
/// `.`/`..` components can point outside the root.
fn validate_name(name: &str) -> Result<(), PersistError> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.len() > MAX_NAME_LEN {
        Some("name is too long")
    } else if name.contains('\0') {
        Some("name contains a null byte")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else if name.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if name == "." || name == ".." {
        Some("name is a directory reference")
    } else if name.starts_with('.') {
        // dot-prefixed files in the root are reserved for in-flight writes
        Some("name must not start with '.'")
    } else if cfg!(windows) && has_drive_prefix(name) {
        Some("name has an absolute path prefix")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PersistError::invalid_name(name, reason)),
        None => Ok(()),
    }
}

fn has_drive_prefix(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(letter), Some(':')) if letter.is_ascii_alphabetic())
}
