//! Dataset Storage Layer Abstraction
//!
//! This module provides an abstraction over dataset storage backends so the
//! batch persister can run against the local filesystem or an in-memory
//! store without knowing which one it talks to. Both backends share the
//! name rules in [`resolver`].

pub mod config;
pub mod local_store;
pub mod mock_store;
pub mod resolver;


use std::path::PathBuf;

use crate::error::PersistError;

/// Resolved on-disk location of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLocation {
    /// Name as submitted by the caller
    pub name: String,
    /// `<name>.csv`
    pub file_name: String,
    /// Managed root joined with `file_name`
    pub path: PathBuf,
}

/// Trait defining the dataset storage interface
pub trait DatasetStorage: Send + Sync {
    /// Make sure the managed root exists and can take writes
    fn ensure_root(&self) -> Result<(), PersistError>;

    /// Map a dataset name to its location, rejecting unsafe names
    fn resolve(&self, name: &str) -> Result<StoredLocation, PersistError>;

    /// Replace the content at `location` in one step, returning bytes written
    fn write_dataset(&self, location: &StoredLocation, content: &[u8]) -> Result<u64, PersistError>;

    /// Read back the content stored at `location`
    fn read_dataset(&self, location: &StoredLocation) -> Result<Vec<u8>, PersistError>;
}
