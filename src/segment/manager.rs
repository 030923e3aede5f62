//! Segment Manager
//!
//! Owns the segment files and the hash index that points into them.
//!
//! ## Responsibilities
//! - Discover and replay existing segments on startup
//! - Append records to the active segment, rotating when it is full
//! - Publish record locations to the index after the bytes are written
//! - Resolve a key hash to its latest location

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, SyncStrategy};
use crate::error::Result;
use crate::index::HashIndex;
use crate::record::{encode, FLAG_LIVE, FLAG_TOMBSTONE};

use super::{parse_segment_id, replay_segment, segment_path, SegmentInfo, SegmentLocation};

/// Id given to the first segment of an empty directory
const INITIAL_SEGMENT_ID: u32 = 0;

/// The segment currently receiving appends
struct ActiveSegment {
    id: u32,
    file: File,
    /// Bytes written so far (== file length)
    len: u64,
    /// Appends since the last fsync
    unsynced: usize,
    /// A failed write left bytes past `len` that could not be cut off
    needs_repair: bool,
}

/// Manages the segment files and the index
///
/// ## Concurrency:
/// Not synchronized on its own. The engine wraps it in a `RwLock`:
/// appends take `&mut self`, lookups and snapshots take `&self`.
pub struct SegmentManager {
    /// Directory where segments are stored
    data_dir: PathBuf,

    /// Segment file extension (without the dot)
    extension: String,

    /// Rotation threshold in bytes
    max_segment_size: u64,

    /// When to fsync the active segment
    sync_strategy: SyncStrategy,

    /// Key hash → latest record location
    index: HashIndex,

    /// Segments no longer appended to, oldest first
    sealed: Vec<SegmentInfo>,

    /// The segment receiving appends
    active: ActiveSegment,
}

impl SegmentManager {
    /// Open or create segment storage described by `config`
    ///
    /// On startup:
    /// 1. Create the data directory if it doesn't exist
    /// 2. Discover existing segment files
    /// 3. Replay them oldest → newest into a fresh index
    /// 4. Continue appending to the newest one (or create segment 0)
    ///
    /// A torn final record of the newest segment is cut off. If the newest
    /// segment holds an unframeable record instead, it is sealed untouched
    /// and appends continue in a fresh segment.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let data_dir = config.data_dir.clone();
        let extension = config.file_extension.clone();

        // Discover existing segments
        let mut ids: Vec<u32> = Vec::new();
        for entry in fs::read_dir(&data_dir)? {
            let path = entry?.path();
            if path.is_file() {
                if let Some(id) = parse_segment_id(&path, &extension) {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();

        // Replay oldest first so later records win
        let mut index = HashIndex::with_capacity(config.index_capacity)?;
        let mut sealed = Vec::new();
        let mut newest = None;

        for (pos, &id) in ids.iter().enumerate() {
            let path = segment_path(&data_dir, id, &extension);
            let stats = replay_segment(&path, id, &mut index)?;

            tracing::info!(
                segment_id = id,
                records = stats.records_replayed,
                tombstones = stats.tombstones_replayed,
                corrupted = stats.records_corrupted,
                truncated = stats.was_truncated,
                unframeable = stats.was_unframeable,
                "Replayed segment"
            );

            if pos + 1 == ids.len() && !stats.was_unframeable {
                newest = Some((id, stats.valid_len));
            } else if stats.was_unframeable {
                let len = fs::metadata(&path)?.len();
                tracing::warn!(
                    segment_id = id,
                    valid_len = stats.valid_len,
                    file_len = len,
                    "Segment has unframeable records, sealing it as is"
                );
                sealed.push(SegmentInfo { id, len });
            } else {
                sealed.push(SegmentInfo {
                    id,
                    len: stats.valid_len,
                });
            }
        }

        let active = match (newest, sealed.last()) {
            (Some((id, valid_len)), _) => {
                Self::open_active(&segment_path(&data_dir, id, &extension), id, valid_len)?
            }
            (None, Some(last)) => {
                let id = next_segment_id(last.id)?;
                Self::open_active(&segment_path(&data_dir, id, &extension), id, 0)?
            }
            (None, None) => Self::open_active(
                &segment_path(&data_dir, INITIAL_SEGMENT_ID, &extension),
                INITIAL_SEGMENT_ID,
                0,
            )?,
        };

        tracing::debug!(
            data_dir = %data_dir.display(),
            segments = sealed.len() + 1,
            active_segment = active.id,
            keys = index.len(),
            "Segment manager ready"
        );

        Ok(Self {
            data_dir,
            extension,
            max_segment_size: config.segment_size_bytes,
            sync_strategy: config.sync_strategy,
            index,
            sealed,
            active,
        })
    }

    /// Append a live record for `key` and point `hash` at it
    ///
    /// An empty `value` is still a live record; use `append_tombstone` to delete.
    pub fn append(&mut self, hash: u64, key: &[u8], value: &[u8]) -> Result<SegmentLocation> {
        let record = encode(key, value, FLAG_LIVE)?;
        let location = self.write_record(&record)?;
        self.index.put(hash, location);
        Ok(location)
    }

    /// Append a tombstone for `key` and drop `hash` from the index
    pub fn append_tombstone(&mut self, hash: u64, key: &[u8]) -> Result<SegmentLocation> {
        let record = encode(key, &[], FLAG_TOMBSTONE)?;
        let location = self.write_record(&record)?;
        self.index.erase(hash);
        Ok(location)
    }

    /// Latest location published for `hash` (index only, no disk access)
    pub fn lookup(&self, hash: u64) -> Option<SegmentLocation> {
        self.index.get(hash).copied()
    }

    /// Every segment with its committed length, oldest first
    pub fn snapshot(&self) -> Vec<SegmentInfo> {
        let mut segments = self.sealed.clone();
        segments.push(SegmentInfo {
            id: self.active.id,
            len: self.active.len,
        });
        segments
    }

    /// Force the active segment to disk
    pub fn sync(&mut self) -> Result<()> {
        self.active.file.sync_all()?;
        self.active.unsynced = 0;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of segment `id`
    pub fn segment_path(&self, id: u32) -> PathBuf {
        segment_path(&self.data_dir, id, &self.extension)
    }

    /// Id of the segment receiving appends
    pub fn active_segment_id(&self) -> u32 {
        self.active.id
    }

    /// Bytes written to the active segment
    pub fn active_segment_len(&self) -> u64 {
        self.active.len
    }

    /// Number of segments, active included
    pub fn segment_count(&self) -> usize {
        self.sealed.len() + 1
    }

    /// Number of hashes in the index
    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Read access to the index
    pub fn index(&self) -> &HashIndex {
        &self.index
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Open `path` for appending, cutting anything past `valid_len`
    fn open_active(path: &Path, id: u32, valid_len: u64) -> Result<ActiveSegment> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let file_len = file.metadata()?.len();
        if file_len > valid_len {
            tracing::warn!(
                segment_id = id,
                file_len,
                valid_len,
                "Truncating torn tail of active segment"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok(ActiveSegment {
            id,
            file,
            len: valid_len,
            unsynced: 0,
            needs_repair: false,
        })
    }

    /// Write an encoded record, rotating first if it would overflow the segment
    fn write_record(&mut self, bytes: &[u8]) -> Result<SegmentLocation> {
        let len = bytes.len() as u64;

        if self.active.needs_repair {
            self.repair_active()?;
        }

        // An oversized record still goes into an empty segment of its own
        if self.active.len > 0 && self.active.len + len > self.max_segment_size {
            self.rotate()?;
        }

        let offset = self.active.len;
        if let Err(e) = self.active.file.write_all(bytes) {
            // Cut off whatever part made it, so the next record starts on a boundary
            if let Err(trunc) = self.active.file.set_len(offset) {
                tracing::error!(
                    segment_id = self.active.id,
                    offset,
                    "Failed to roll back partial write, appends blocked until repaired: {}",
                    trunc
                );
                self.active.needs_repair = true;
            }
            return Err(e.into());
        }

        self.active.len += len;
        self.active.unsynced += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.active.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(SegmentLocation::new(self.active.id, offset))
    }

    /// Cut the active file back to the last complete record
    fn repair_active(&mut self) -> Result<()> {
        self.active.file.set_len(self.active.len)?;
        self.active.file.sync_all()?;
        self.active.needs_repair = false;

        tracing::info!(
            segment_id = self.active.id,
            len = self.active.len,
            "Repaired active segment after failed write"
        );
        Ok(())
    }

    /// Seal the active segment and start the next one
    fn rotate(&mut self) -> Result<()> {
        self.sync()?;

        let next_id = next_segment_id(self.active.id)?;
        let next = Self::open_active(&self.segment_path(next_id), next_id, 0)?;
        let previous = std::mem::replace(&mut self.active, next);

        tracing::debug!(
            sealed_segment = previous.id,
            sealed_len = previous.len,
            active_segment = next_id,
            "Rotated segment"
        );

        self.sealed.push(SegmentInfo {
            id: previous.id,
            len: previous.len,
        });
        Ok(())
    }
}

fn next_segment_id(id: u32) -> Result<u32> {
    let next = id
        .checked_add(1)
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "segment id space exhausted"))?;
    Ok(next)
}
