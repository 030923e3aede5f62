//! Segment Module
//!
//! Append-only segment files and the manager that rotates them.
//!
//! ## Responsibilities
//! - Append encoded records at the end of the active segment
//! - Rotate to `segment_<id+1>` once the active file would exceed its limit
//! - Publish each record's location to the hash index after it is written
//! - Rebuild the index on startup by replaying every segment
//! - Sequential scans over all records
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   ├── segment_0.kv     (sealed)
//!   ├── segment_1.kv     (sealed)
//!   └── segment_2.kv     (active, appended to)
//! ```
//!
//! Segments are never rewritten, truncated or deleted during normal
//! operation. The exceptions are a torn record at the tail of the newest
//! segment, cut off at startup, and the partial bytes of a failed append.
//! A segment holding a record that cannot be framed is sealed as it is.

mod manager;
mod replay;
mod scan;

use std::path::{Path, PathBuf};

pub use manager::SegmentManager;
pub use replay::{replay_segment, ReplayStats};
pub use scan::{DamagedRecord, ScanAll, ScannedRecord, SegmentReader};

/// Where a record starts: the offset of its `record_len` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentLocation {
    pub segment_id: u32,
    pub offset: u64,
}

impl SegmentLocation {
    pub fn new(segment_id: u32, offset: u64) -> Self {
        Self { segment_id, offset }
    }
}

/// A segment and the number of bytes committed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    pub id: u32,
    pub len: u64,
}

/// Path of segment `id` under `dir`: `segment_<id>.<ext>`
pub fn segment_path(dir: &Path, id: u32, extension: &str) -> PathBuf {
    dir.join(format!("segment_{}.{}", id, extension))
}

/// Parse a segment id from a file name
/// "segment_42.kv" → Some(42)
pub fn parse_segment_id(path: &Path, extension: &str) -> Option<u32> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let id_str = stem.strip_prefix("segment_")?;
    // Reject "segment_+1", "segment_01" style names; ids are canonical decimal
    if id_str.is_empty() || !id_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if id_str.len() > 1 && id_str.starts_with('0') {
        return None;
    }
    id_str.parse().ok()
}
