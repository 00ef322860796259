//! Batch data model
//!
//! Value types exchanged between the HTTP adapter and the batch persister.
//! `DatasetEntry` and `Batch` deserialize straight from the upload body
//! (`{"sheets": [{"name": ..., "csv": ...}]}`).

use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// One named dataset submitted for storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetEntry {
    /// Caller-supplied identifier, becomes the file stem
    pub name: String,
    /// Raw tabular text
    #[serde(rename = "csv")]
    pub content: String,
}

impl DatasetEntry {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Ordered collection of entries submitted in one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "sheets")]
    entries: Vec<DatasetEntry>,
}

impl Batch {
    pub fn new(entries: Vec<DatasetEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<DatasetEntry> for Batch {
    fn from_iter<I: IntoIterator<Item = DatasetEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result of persisting a single entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceOutcome {
    pub name: String,
    pub status: OutcomeStatus,
    /// Error kind and message, failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,
    /// Hex MD5 of the stored content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl PersistenceOutcome {
    pub fn success(name: &str, bytes_written: u64, checksum: String) -> Self {
        Self {
            name: name.to_string(),
            status: OutcomeStatus::Success,
            detail: None,
            bytes_written: Some(bytes_written),
            checksum: Some(checksum),
        }
    }

    pub fn failure(name: &str, error: &PersistError) -> Self {
        Self {
            name: name.to_string(),
            status: OutcomeStatus::Failure,
            detail: Some(error.detail()),
            bytes_written: None,
            checksum: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Summary of one batch, outcomes in submission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<PersistenceOutcome>,
}

impl BatchResult {
    pub fn from_outcomes(outcomes: Vec<PersistenceOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
