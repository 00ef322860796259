//! Configuration for dataset storage backends

use crate::config::StorageConfig;
use crate::storage::{DatasetStorage, local_store::LocalDatasetStore, mock_store::MockDatasetStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::env;
use log::info;

/// Available dataset storage backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum StorageBackend {
    #[default]
    LocalFs,
    Mock,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "localfs" | "local" | "fs" => Ok(StorageBackend::LocalFs),
            "mock" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s))
        }
    }
}

impl StorageBackend {
    /// Backend named by `STORAGE_BACKEND`; `Ok(None)` when the variable is unset
    pub fn from_env() -> Result<Option<Self>, String> {
        match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse().map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Create a storage instance based on the configuration
pub fn create_store(config: &StorageConfig) -> Arc<dyn DatasetStorage> {
    match config.backend {
        StorageBackend::LocalFs => Arc::new(LocalDatasetStore::new(config)),
        StorageBackend::Mock => {
            info!("Using mock storage backend");
            Arc::new(MockDatasetStore::new())
        }
    }
}
