//! Mock implementation of DatasetStorage for testing

use crate::error::PersistError;
use crate::storage::resolver::StorageResolver;
use crate::storage::{DatasetStorage, StoredLocation};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use log::info;

const MOCK_ROOT: &str = "mock-uploads";

/// In-memory dataset storage with failure injection
pub struct MockDatasetStore {
    resolver: StorageResolver,
    // file_name -> content
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    root_available: Arc<Mutex<bool>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
    write_log: Arc<Mutex<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockDatasetStore {
    pub fn new() -> Self {
        Self {
            resolver: StorageResolver::new(MOCK_ROOT),
            data: Arc::new(Mutex::new(HashMap::new())),
            root_available: Arc::new(Mutex::new(true)),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
            write_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `ensure_root` fail until switched back
    pub fn set_root_available(&self, available: bool) {
        *lock(&self.root_available) = available;
    }

    /// Make every write of dataset `name` fail
    pub fn fail_writes_for(&self, name: &str) {
        lock(&self.failing_names).insert(name.to_string());
    }

    /// Number of distinct datasets stored
    pub fn dataset_count(&self) -> usize {
        lock(&self.data).len()
    }

    /// Content stored for dataset `name`, if any
    pub fn content_of(&self, name: &str) -> Option<Vec<u8>> {
        let location = self.resolver.resolve(name).ok()?;
        lock(&self.data).get(&location.file_name).cloned()
    }

    /// File names in the order they were written
    pub fn write_log(&self) -> Vec<String> {
        lock(&self.write_log).clone()
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        lock(&self.data).clear();
        lock(&self.write_log).clear();
    }
}

impl Default for MockDatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStorage for MockDatasetStore {
    fn ensure_root(&self) -> Result<(), PersistError> {
        if *lock(&self.root_available) {
            Ok(())
        } else {
            Err(PersistError::storage_unavailable(self.resolver.root(), "mock root disabled"))
        }
    }

    fn resolve(&self, name: &str) -> Result<StoredLocation, PersistError> {
        self.resolver.resolve(name)
    }

    fn write_dataset(&self, location: &StoredLocation, content: &[u8]) -> Result<u64, PersistError> {
        if lock(&self.failing_names).contains(&location.name) {
            return Err(PersistError::write_failure(&location.path, "injected write failure"));
        }

        lock(&self.data).insert(location.file_name.clone(), content.to_vec());
        lock(&self.write_log).push(location.file_name.clone());
        info!("Mock stored dataset {} ({} bytes)", location.name, content.len());
        Ok(content.len() as u64)
    }

    fn read_dataset(&self, location: &StoredLocation) -> Result<Vec<u8>, PersistError> {
        lock(&self.data)
            .get(&location.file_name)
            .cloned()
            .ok_or_else(|| PersistError::NotFound {
                path: location.path.clone(),
            })
    }
}
