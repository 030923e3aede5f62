//! # DynaKV
//!
//! An embedded key-value store with:
//! - Append-only, rotating segment files of CRC-checked records
//! - An in-memory robin-hood hash index for O(1) point lookups
//! - Tombstone deletes and last-writer-wins updates
//! - Single-writer/multi-reader concurrency model
//! - Index rebuild by segment replay on startup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Model / CLI (callers)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put / get / erase / scan
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Engine                                  │
//! │         (RwLock: exclusive writes, shared lookups)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Segment    │─────────▶│ Hash Index  │
//!   │  Manager    │ publish  │(robin-hood) │
//!   └──────┬──────┘          └─────────────┘
//!          │ append
//!          ▼
//!   ┌─────────────┐
//!   │ segment_N.kv│  (Record codec, CRC32)
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod hash;
pub mod record;
pub mod index;
pub mod segment;
pub mod engine;
pub mod model;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DynaError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of DynaKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
