//! Local filesystem dataset storage implementation

use crate::config::StorageConfig;
use crate::error::PersistError;
use crate::storage::resolver::{StorageResolver, TEMP_PREFIX};
use crate::storage::{DatasetStorage, StoredLocation};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use log::{debug, info};
use tempfile::Builder;

/// Local filesystem storage, one `<name>.csv` file per dataset
pub struct LocalDatasetStore {
    resolver: StorageResolver,
}

impl LocalDatasetStore {
    pub fn new(config: &StorageConfig) -> Self {
        info!("Using local dataset storage directory: {}", config.root_dir);
        Self::with_root(&config.root_dir)
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            resolver: StorageResolver::new(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Write to a temp file next to the target, sync it, rename over the
    /// target, then sync the directory so the rename survives a crash.
    fn write_atomic(&self, location: &StoredLocation, content: &[u8]) -> io::Result<u64> {
        let dir = match location.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)?;

        temp.write_all(content)?;
        temp.flush()?;
        temp.as_file().sync_all()?;

        // On failure the temp file is dropped and removed
        temp.persist(&location.path).map_err(|e| e.error)?;
        sync_dir(dir)?;
        Ok(content.len() as u64)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

// Directory handles cannot be opened for syncing here
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl DatasetStorage for LocalDatasetStore {
    fn ensure_root(&self) -> Result<(), PersistError> {
        self.resolver.ensure_root()
    }

    fn resolve(&self, name: &str) -> Result<StoredLocation, PersistError> {
        self.resolver.resolve(name)
    }

    fn write_dataset(&self, location: &StoredLocation, content: &[u8]) -> Result<u64, PersistError> {
        let size = self
            .write_atomic(location, content)
            .map_err(|e| PersistError::write_failure(&location.path, e))?;

        debug!("Wrote dataset {} ({} bytes) to {}", location.name, size, location.path.display());
        Ok(size)
    }

    fn read_dataset(&self, location: &StoredLocation) -> Result<Vec<u8>, PersistError> {
        fs::read(&location.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PersistError::NotFound {
                path: location.path.clone(),
            },
            _ => PersistError::read_failure(&location.path, e),
        })
    }
}
