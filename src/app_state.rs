//! Application State Management
//!
//! This module provides the application state that contains all services
//! and their dependencies, following the dependency injection pattern.

use std::sync::Arc;
use log::info;

use crate::config::AppConfig;
use crate::service::persist_service::BatchPersister;
use crate::storage::{DatasetStorage, config::create_store, mock_store::MockDatasetStore};

/// Application state containing all services and their dependencies
#[derive(Clone)]
pub struct AppState {
    pub persister: Arc<BatchPersister>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Self {
        info!("Initializing application state with backend {:?}, root {}",
              config.storage.backend, config.storage.root_dir);
        let storage = create_store(&config.storage);
        Self::with_storage(config, storage)
    }

    /// Create application state around an already built storage backend
    pub fn with_storage(config: AppConfig, storage: Arc<dyn DatasetStorage>) -> Self {
        Self {
            persister: Arc::new(BatchPersister::new(storage)),
            config,
        }
    }

    /// Create application state for testing with the mock backend
    pub fn new_for_testing() -> Self {
        Self::with_storage(AppConfig::default(), Arc::new(MockDatasetStore::new()))
    }
}
