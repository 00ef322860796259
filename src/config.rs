//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::fs;
use log::{info, log, Level};

pub use crate::storage::config::StorageBackend;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// What loading did, kept until the logger is up
    #[serde(skip)]
    pub notes: Vec<(Level, String)>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum upload body size in bytes
    pub max_payload_size: u64,
    /// Value of `Access-Control-Allow-Origin`
    pub cors_allow_origin: String,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackend,
    /// Managed root directory for stored datasets
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log4rs configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: 4,
            max_payload_size: 256 * 1024 * 1024, // 256MB
            cors_allow_origin: "*".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::LocalFs,
            root_dir: "uploads".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `SHEET_STORE_CONFIG` or `config.yaml`, then apply env overrides
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("SHEET_STORE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from file, use defaults if not found
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = config_path.as_ref();
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let mut config: AppConfig = serde_yaml::from_str(&content)?;
            config.note(Level::Info, format!("Loaded configuration from {}", config_path.display()));
            Ok(config)
        } else {
            let mut config = Self::default();
            config.note(Level::Warn, format!("Config file {} not found, using defaults", config_path.display()));
            Ok(config)
        }
    }

    /// `STORAGE_DIRECTORY` and `STORAGE_BACKEND` win over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("STORAGE_DIRECTORY") {
            self.note(Level::Info, format!("Using storage directory from environment: {}", dir));
            self.storage.root_dir = dir;
        }
        match StorageBackend::from_env() {
            Ok(Some(backend)) => {
                self.note(Level::Info, format!("Using storage backend from environment: {:?}", backend));
                self.storage.backend = backend;
            }
            Ok(None) => {}
            Err(e) => self.note(
                Level::Warn,
                format!("Invalid storage backend in environment: {}. Keeping configured backend.", e),
            ),
        }
    }

    fn note(&mut self, level: Level, message: String) {
        self.notes.push((level, message));
    }

    /// Emit the notes gathered while loading. Call once logging is initialized.
    pub fn log_summary(&self) {
        for (level, message) in &self.notes {
            log!(*level, "{}", message);
        }
        info!(
            "Storage backend {:?} at {}, max payload {} bytes",
            self.storage.backend, self.storage.root_dir, self.server.max_payload_size
        );
    }
}
