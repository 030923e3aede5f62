//! Error types for DynaKV
//!
//! Provides a unified error type for all operations.
//!
//! Absence is never an error: a missing key, a tombstone and a hash collision
//! all come back as `Ok(None)` / `Ok(false)` from the engine.

use thiserror::Error;

/// Result type alias using DynaError
pub type Result<T> = std::result::Result<T, DynaError>;

/// Unified error type for DynaKV operations
#[derive(Debug, Error)]
pub enum DynaError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Truncated record: expected {expected} bytes, {available} available")]
    TruncatedRecord { expected: u64, available: u64 },

    #[error("CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("{field} too large for record format: {len} bytes")]
    RecordTooLarge { field: &'static str, len: usize },

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Invalid index capacity: {0}")]
    InvalidCapacity(usize),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DynaError {
    /// True for errors that mean the bytes on disk are damaged
    /// (as opposed to the disk itself failing).
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DynaError::TruncatedRecord { .. }
                | DynaError::CrcMismatch { .. }
                | DynaError::InvalidRecord(_)
        )
    }
}
