//! Error taxonomy for dataset persistence.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving or persisting datasets.
///
/// Only [`PersistError::StorageUnavailable`] is fatal for a whole batch; the
/// other variants are recorded against a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("storage root {} is unavailable: {reason}", .root.display())]
    StorageUnavailable { root: PathBuf, reason: String },

    #[error("invalid dataset name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("failed to write {}: {reason}", .path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("failed to read {}: {reason}", .path.display())]
    ReadFailure { path: PathBuf, reason: String },

    #[error("no dataset stored at {}", .path.display())]
    NotFound { path: PathBuf },
}

impl PersistError {
    pub fn storage_unavailable(root: &Path, reason: impl ToString) -> Self {
        PersistError::StorageUnavailable {
            root: root.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_name(name: &str, reason: impl ToString) -> Self {
        PersistError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failure(path: &Path, reason: impl ToString) -> Self {
        PersistError::WriteFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn read_failure(path: &Path, reason: impl ToString) -> Self {
        PersistError::ReadFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Stable tag used as the prefix of outcome details.
    pub fn kind(&self) -> &'static str {
        match self {
            PersistError::StorageUnavailable { .. } => "StorageUnavailable",
            PersistError::InvalidName { .. } => "InvalidName",
            PersistError::WriteFailure { .. } => "WriteFailure",
            PersistError::ReadFailure { .. } => "ReadFailure",
            PersistError::NotFound { .. } => "NotFound",
        }
    }

    /// `"<kind>: <message>"`, as reported to callers.
    pub fn detail(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
