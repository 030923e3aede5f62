//! Configuration for DynaKV
//!
//! Centralized configuration with sensible defaults, plus a loader for the
//! JSON settings file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DynaError, Result};

/// Main configuration for a DynaKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the segment files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── segment_0.kv
    ///     ├── segment_1.kv
    ///     └── ...
    pub data_dir: PathBuf,

    /// Rotate to a new segment once the active one would grow past this
    pub segment_size_bytes: u64,

    /// Extension of segment files (without the dot)
    pub file_extension: String,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the active segment
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Initial slot count of the in-memory hash index
    pub index_capacity: usize,
}

/// Segment sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N appends (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./dynakv_data"),
            segment_size_bytes: 16 * 1024 * 1024, // 16 MB
            file_extension: "kv".to_string(),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            index_capacity: 1024,
        }
    }
}

/// On-disk settings file layout
///
/// ```json
/// { "data_dir": "./data", "segment_size_mb": 16, "file_extension": "kv" }
/// ```
#[derive(Debug, Deserialize)]
struct FileSettings {
    data_dir: PathBuf,
    segment_size_mb: u64,
    #[serde(default = "default_extension")]
    file_extension: String,
}

fn default_extension() -> String {
    "kv".to_string()
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load storage settings from a JSON file
    ///
    /// Fields not present in the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            DynaError::Config(format!("could not open config file '{}': {}", path.display(), e))
        })?;

        if raw.trim().is_empty() {
            return Err(DynaError::Config(format!(
                "config file is empty: '{}'",
                path.display()
            )));
        }

        let settings: FileSettings = serde_json::from_str(&raw).map_err(|e| {
            DynaError::Config(format!("invalid config file '{}': {}", path.display(), e))
        })?;

        let segment_size_bytes = settings
            .segment_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                DynaError::Config(format!(
                    "segment_size_mb out of range: {}",
                    settings.segment_size_mb
                ))
            })?;

        let config = Config::builder()
            .data_dir(settings.data_dir)
            .segment_size_bytes(segment_size_bytes)
            .file_extension(settings.file_extension)
            .build();

        config.validate()?;
        Ok(config)
    }

    /// Check the settings the engine relies on at construction
    pub fn validate(&self) -> Result<()> {
        if self.segment_size_bytes == 0 {
            return Err(DynaError::Config(
                "segment_size_bytes must be greater than zero".to_string(),
            ));
        }

        let ext = &self.file_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(DynaError::Config(format!(
                "invalid file extension: {:?}",
                ext
            )));
        }

        if self.index_capacity == 0 {
            return Err(DynaError::Config(
                "index_capacity must be at least 1".to_string(),
            ));
        }

        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(DynaError::Config(
                "sync count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all segments)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the maximum segment size (in bytes)
    pub fn segment_size_bytes(mut self, size: u64) -> Self {
        self.config.segment_size_bytes = size;
        self
    }

    /// Set the maximum segment size (in megabytes)
    pub fn segment_size_mb(mut self, mb: u64) -> Self {
        self.config.segment_size_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    /// Set the segment file extension
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.file_extension = ext.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the initial hash index capacity
    pub fn index_capacity(mut self, capacity: usize) -> Self {
        self.config.index_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
