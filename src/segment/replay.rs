//! Segment replay
//!
//! Rebuilds the hash index on startup by reading every record of a segment in
//! append order. Later records win, tombstones remove their hash.

use std::path::Path;

use crate::error::{DynaError, Result};
use crate::hash::fnv1a;
use crate::index::HashIndex;

use super::SegmentReader;

/// Result of replaying one segment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Live records whose location was published to the index
    pub records_replayed: u64,

    /// Tombstones applied to the index
    pub tombstones_replayed: u64,

    /// Records whose checksum did not match. Their location is still
    /// published, so the key reads as damaged instead of as an older version.
    pub records_corrupted: u64,

    /// Replay stopped at a record cut short by the end of the file
    pub was_truncated: bool,

    /// Replay stopped at a header that cannot be framed, with bytes after it
    /// that may still hold records
    pub was_unframeable: bool,

    /// Offset just past the last framed record
    pub valid_len: u64,
}

/// Replay segment `segment_id` at `path` into `index`.
///
/// I/O errors abort the replay; damaged records are counted, not fatal.
pub fn replay_segment(path: &Path, segment_id: u32, index: &mut HashIndex) -> Result<ReplayStats> {
    let mut reader = SegmentReader::open_full(path, segment_id)?;
    let mut stats = ReplayStats::default();

    while let Some(item) = reader.next() {
        match item {
            Ok(scanned) => {
                let hash = fnv1a(&scanned.record.key);
                if scanned.record.is_live() {
                    index.put(hash, scanned.location);
                    stats.records_replayed += 1;
                } else {
                    index.erase(hash);
                    stats.tombstones_replayed += 1;
                }
            }
            Err(DynaError::CrcMismatch { stored, computed }) => {
                // Shadow older versions of the key with the damaged record
                if let Some(damaged) = reader.take_damaged() {
                    index.put(fnv1a(&damaged.key), damaged.location);
                    tracing::warn!(
                        segment_id,
                        offset = damaged.location.offset,
                        stored,
                        computed,
                        "Checksum mismatch during replay"
                    );
                }
                stats.records_corrupted += 1;
            }
            Err(e @ DynaError::TruncatedRecord { .. }) => {
                tracing::warn!(segment_id, "Replay stopped at torn tail: {}", e);
                stats.was_truncated = true;
            }
            Err(e) if e.is_corruption() => {
                tracing::warn!(
                    segment_id,
                    offset = reader.offset(),
                    "Replay stopped at unframeable record: {}",
                    e
                );
                stats.was_unframeable = true;
            }
            Err(e) => return Err(e),
        }
    }

    stats.valid_len = reader.offset();
    Ok(stats)
}
