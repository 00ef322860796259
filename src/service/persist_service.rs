//! Batch persister: writes every entry of a batch and reports per-entry outcomes

use crate::error::PersistError;
use crate::model::{Batch, BatchResult, DatasetEntry, PersistenceOutcome};
use crate::storage::DatasetStorage;
use std::sync::Arc;
use log::{debug, error, info, warn};
use md5;

/// Persists batches through an injected storage backend
pub struct BatchPersister {
    storage: Arc<dyn DatasetStorage>,
}

impl BatchPersister {
    /// Create a new persister with injected storage backend
    pub fn new(storage: Arc<dyn DatasetStorage>) -> Self {
        Self { storage }
    }

    /// Calculate MD5 checksum for data
    fn calculate_checksum(data: &[u8]) -> String {
        let hash = md5::compute(data);
        format!("{:x}", hash)
    }

    /// Persist every entry of `batch`, in order.
    ///
    /// Returns `Err(StorageUnavailable)` without touching any entry when the
    /// managed root cannot be prepared. Past that point entry failures are
    /// reported as outcomes and the call always returns `Ok`.
    pub fn persist_batch(&self, batch: &Batch) -> Result<BatchResult, PersistError> {
        if let Err(e) = self.storage.ensure_root() {
            error!("Storage unavailable, rejecting batch of {} entries: {}", batch.len(), e);
            return Err(e);
        }

        let outcomes = batch
            .entries()
            .iter()
            .map(|entry| self.persist_entry(entry))
            .collect();
        let result = BatchResult::from_outcomes(outcomes);

        info!("Persisted batch: total={}, succeeded={}, failed={}", result.total, result.succeeded, result.failed);
        Ok(result)
    }

    fn persist_entry(&self, entry: &DatasetEntry) -> PersistenceOutcome {
        let location = match self.storage.resolve(&entry.name) {
            Ok(location) => location,
            Err(e) => {
                warn!("Rejected dataset name {:?}: {}", entry.name, e);
                return PersistenceOutcome::failure(&entry.name, &e);
            }
        };

        let content = entry.content.as_bytes();
        match self.storage.write_dataset(&location, content) {
            Ok(bytes_written) => {
                debug!("Stored dataset {:?} at {}", entry.name, location.path.display());
                PersistenceOutcome::success(&entry.name, bytes_written, Self::calculate_checksum(content))
            }
            Err(e) => {
                warn!("Failed to store dataset {:?}: {}", entry.name, e);
                PersistenceOutcome::failure(&entry.name, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutcomeStatus;
    use crate::storage::local_store::LocalDatasetStore;
    use crate::storage::mock_store::MockDatasetStore;
    use std::fs;

    fn mock_persister() -> (Arc<MockDatasetStore>, BatchPersister) {
        let store = Arc::new(MockDatasetStore::new());
        let persister = BatchPersister::new(store.clone());
        (store, persister)
    }

    #[test]
    fn test_persist_two_datasets() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(&root)));

        let batch = Batch::new(vec![
            DatasetEntry::new("sales", "a,b\n1,2"),
            DatasetEntry::new("inventory", "x,y\n3,4"),
        ]);
        let result = persister.persist_batch(&batch).unwrap();

        assert_eq!(result.total, 2);
        assert!(result.all_succeeded());
        assert_eq!(result.outcomes[0].name, "sales");
        assert_eq!(result.outcomes[1].name, "inventory");
        assert_eq!(fs::read_to_string(root.join("sales.csv")).unwrap(), "a,b\n1,2");
        assert_eq!(fs::read_to_string(root.join("inventory.csv")).unwrap(), "x,y\n3,4");
    }

    #[test]
    fn test_outcome_reports_size_and_checksum() {
        let (_store, persister) = mock_persister();
        let result = persister.persist_batch(&Batch::new(vec![DatasetEntry::new("a", "hello")])).unwrap();

        let outcome = &result.outcomes[0];
        assert_eq!(outcome.bytes_written, Some(5));
        assert_eq!(outcome.checksum.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
        assert!(outcome.detail.is_none());
    }

    #[test]
    fn test_empty_name_fails_but_root_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(&root)));

        let result = persister.persist_batch(&Batch::new(vec![DatasetEntry::new("", "a")])).unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.outcomes[0].status, OutcomeStatus::Failure);
        assert!(result.outcomes[0].detail.as_deref().unwrap().starts_with("InvalidName"));
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_traversal_names_never_escape_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(&root)));
        let absolute = temp.path().join("absolute").to_string_lossy().into_owned();

        let batch = Batch::new(vec![
            DatasetEntry::new("../secret", "leak"),
            DatasetEntry::new(absolute.as_str(), "leak"),
            DatasetEntry::new("ok", "fine"),
        ]);
        let result = persister.persist_batch(&batch).unwrap();

        assert_eq!(result.outcomes[0].status, OutcomeStatus::Failure);
        assert_eq!(result.outcomes[1].status, OutcomeStatus::Failure);
        assert!(result.outcomes[0].detail.as_deref().unwrap().starts_with("InvalidName"));
        assert!(result.outcomes[1].detail.as_deref().unwrap().starts_with("InvalidName"));
        assert_eq!(result.outcomes[2].status, OutcomeStatus::Success);

        assert!(!temp.path().join("secret.csv").exists());
        assert!(!temp.path().join("absolute.csv").exists());
        let mut top_level: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        top_level.sort();
        assert_eq!(top_level, vec!["uploads".to_string()]);
    }

    #[test]
    fn test_last_writer_wins_within_batch() {
        let (store, persister) = mock_persister();
        let batch = Batch::new(vec![
            DatasetEntry::new("dup", "first"),
            DatasetEntry::new("other", "x"),
            DatasetEntry::new("dup", "second"),
        ]);

        let result = persister.persist_batch(&batch).unwrap();

        assert_eq!(result.succeeded, 3);
        assert_eq!(store.content_of("dup"), Some(b"second".to_vec()));
        assert_eq!(store.write_log(), vec!["dup.csv", "other.csv", "dup.csv"]);
    }

    #[test]
    fn test_same_pair_twice_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(temp.path())));
        let batch = Batch::new(vec![DatasetEntry::new("sales", "a,b\n1,2")]);

        let first = persister.persist_batch(&batch).unwrap();
        let second = persister.persist_batch(&batch).unwrap();

        assert!(first.all_succeeded());
        assert!(second.all_succeeded());
        assert_eq!(first.outcomes[0].checksum, second.outcomes[0].checksum);
        assert_eq!(fs::read_to_string(temp.path().join("sales.csv")).unwrap(), "a,b\n1,2");
    }

    #[test]
    fn test_write_failure_does_not_abort_batch() {
        let (store, persister) = mock_persister();
        store.fail_writes_for("broken");
        let batch = Batch::new(vec![
            DatasetEntry::new("before", "1"),
            DatasetEntry::new("broken", "2"),
            DatasetEntry::new("after", "3"),
        ]);

        let result = persister.persist_batch(&batch).unwrap();

        let statuses: Vec<_> = result.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![OutcomeStatus::Success, OutcomeStatus::Failure, OutcomeStatus::Success]);
        assert!(result.outcomes[1].detail.as_deref().unwrap().starts_with("WriteFailure"));
        assert_eq!(result.failed, 1);
        assert_eq!(store.dataset_count(), 2);
    }

    #[test]
    fn test_storage_unavailable_fails_whole_batch() {
        let (store, persister) = mock_persister();
        store.set_root_available(false);
        let batch = Batch::new(vec![DatasetEntry::new("a", "1"), DatasetEntry::new("b", "2")]);

        let err = persister.persist_batch(&batch).unwrap_err();

        assert_eq!(err.kind(), "StorageUnavailable");
        assert!(store.write_log().is_empty());
    }

    #[test]
    fn test_root_occupied_by_file_fails_whole_batch() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");
        fs::write(&root, "i am a file").unwrap();
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(&root)));

        let batch = Batch::new(vec![DatasetEntry::new("a", "1")]);
        let err = persister.persist_batch(&batch).unwrap_err();

        assert!(matches!(err, PersistError::StorageUnavailable { .. }));
        assert_eq!(fs::read_to_string(&root).unwrap(), "i am a file");
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_root_fails_whole_batch() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("uploads");
        fs::create_dir(&root).unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o555)).unwrap();
        let persister = BatchPersister::new(Arc::new(LocalDatasetStore::with_root(&root)));

        let privileged = fs::write(root.join("canary"), "x").is_ok();
        let batch = Batch::new(vec![DatasetEntry::new("a", "1"), DatasetEntry::new("b", "2")]);
        let result = persister.persist_batch(&batch);
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        let err = result.unwrap_err();
        assert!(matches!(err, PersistError::StorageUnavailable { .. }));
        assert!(!root.join("a.csv").exists());
    }

    #[test]
    fn test_empty_batch() {
        let (_store, persister) = mock_persister();
        let result = persister.persist_batch(&Batch::default()).unwrap();
        assert_eq!(result.total, 0);
        assert!(result.outcomes.is_empty());
    }

    #[test]
    fn test_outcome_order_matches_input() {
        let (_store, persister) = mock_persister();
        let names = ["z", "", "a", "../x", "m", "a"];
        let batch: Batch = names.iter().map(|n| DatasetEntry::new(*n, "v")).collect();

        let result = persister.persist_batch(&batch).unwrap();

        assert_eq!(result.total, names.len());
        let reported: Vec<_> = result.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(reported, names);
    }
}
