//! Engine Module
//!
//! The storage engine facade over the segment manager.
//!
//! ## Responsibilities
//! - Hash keys and route put/get/erase to the segment manager
//! - Guard the index and active segment with a single reader/writer lock
//! - Read, verify and key-check records on the `get` path
//! - Full scans over a consistent snapshot of the segment files

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{DynaError, Result};
use crate::hash::fnv1a;
use crate::record::Record;
use crate::segment::{segment_path, ScanAll, SegmentLocation, SegmentManager};

/// What the read path found at an indexed location
#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// Live record for the requested key
    Found(Vec<u8>),
    /// The location holds a tombstone
    Tombstone,
    /// The location holds a different key with the same hash
    Collision,
}

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader
///
/// - **Writes** (put/erase): exclusive lock on the segment manager for the
///   whole append + index update.
/// - **Reads** (get): shared lock only for the index lookup; the record is
///   read from disk after the lock is released. Locations are published
///   after their bytes are written, so the read never races the append.
/// - **Scans**: shared lock only to snapshot segment lengths.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Segments + index (the only shared mutable state)
    segments: RwLock<SegmentManager>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// Existing segments are replayed to rebuild the index.
    pub fn open(config: Config) -> Result<Self> {
        let segments = SegmentManager::open(&config)?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            segments = segments.segment_count(),
            keys = segments.index_len(),
            "Engine opened"
        );

        Ok(Self {
            config,
            segments: RwLock::new(segments),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Put a key-value pair
    ///
    /// An empty value is stored as a live, empty value.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let hash = fnv1a(key);
        let mut segments = self.segments.write();
        segments.append(hash, key, value)?;
        Ok(())
    }

    /// Get a value by key
    ///
    /// Returns `Ok(None)` for unknown keys, deleted keys, hash collisions and
    /// damaged records. Damage is logged; use `get_checked` to see it.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.get_checked(key) {
            Err(e) if e.is_corruption() => {
                tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    "Treating damaged record as absent: {}",
                    e
                );
                Ok(None)
            }
            other => other,
        }
    }

    /// Get a value by key, surfacing damaged records as errors
    ///
    /// Returns:
    /// - `Ok(Some(value))`: live record for this key
    /// - `Ok(None)`: unknown key, tombstone, or another key with the same hash
    /// - `Err(TruncatedRecord | CrcMismatch | InvalidRecord)`: damaged record
    /// - `Err(Io)`: the segment could not be read
    pub fn get_checked(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let hash = fnv1a(key);

        // Shared lock only for the index lookup
        let location = match self.segments.read().lookup(hash) {
            Some(location) => location,
            None => return Ok(None),
        };

        match self.read_at(key, location)? {
            ReadOutcome::Found(value) => Ok(Some(value)),
            ReadOutcome::Tombstone => Ok(None),
            ReadOutcome::Collision => {
                tracing::debug!(
                    key = %String::from_utf8_lossy(key),
                    segment_id = location.segment_id,
                    offset = location.offset,
                    "Hash collision on read, key reported absent"
                );
                Ok(None)
            }
        }
    }

    /// Delete a key
    ///
    /// Returns false if the key was not present. Otherwise appends a
    /// tombstone and returns true.
    pub fn erase(&self, key: &[u8]) -> Result<bool> {
        let hash = fnv1a(key);
        let mut segments = self.segments.write();

        if segments.lookup(hash).is_none() {
            return Ok(false);
        }

        segments.append_tombstone(hash, key)?;
        Ok(true)
    }

    /// Every live record in every segment, oldest segment first
    ///
    /// Not de-duplicated: a key written twice appears twice. The segment list
    /// and lengths are captured up front, so concurrent writes are either
    /// entirely visible or not at all.
    pub fn scan_all(&self) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> {
        self.scan_snapshot()
            .map(|item| item.map(|scanned| (scanned.record.key, scanned.record.value)))
    }

    /// Like `scan_all`, but only the latest live version of each key
    ///
    /// A record is kept when the index still points at its location.
    pub fn scan_latest(&self) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + '_ {
        self.scan_snapshot().filter_map(move |item| match item {
            Ok(scanned) => {
                let current = self.segments.read().lookup(fnv1a(&scanned.record.key));
                (current == Some(scanned.location))
                    .then(|| Ok((scanned.record.key, scanned.record.value)))
            }
            Err(e) => Some(Err(e)),
        })
    }

    /// Flush the active segment to disk
    pub fn sync(&self) -> Result<()> {
        self.segments.write().sync()
    }

    /// Close the engine gracefully
    ///
    /// Syncs the active segment to disk
    pub fn close(self) -> Result<()> {
        let mut segments = self.segments.into_inner();
        segments.sync()?;
        tracing::info!(
            segments = segments.segment_count(),
            keys = segments.index_len(),
            "Engine closed"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of segment files, active included
    pub fn segment_count(&self) -> usize {
        self.segments.read().segment_count()
    }

    /// Id of the segment receiving appends
    pub fn active_segment_id(&self) -> u32 {
        self.segments.read().active_segment_id()
    }

    /// Number of hashes in the index
    pub fn index_len(&self) -> usize {
        self.segments.read().index_len()
    }

    /// Location the index holds for `key`, if any
    pub fn location_of(&self, key: &[u8]) -> Option<SegmentLocation> {
        self.segments.read().lookup(fnv1a(key))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn segment_file(&self, id: u32) -> PathBuf {
        segment_path(&self.config.data_dir, id, &self.config.file_extension)
    }

    /// Read and verify the record at `location` (no lock held)
    fn read_at(&self, key: &[u8], location: SegmentLocation) -> Result<ReadOutcome> {
        let mut file = File::open(self.segment_file(location.segment_id))?;
        let file_len = file.metadata()?.len();

        if location.offset >= file_len {
            return Err(DynaError::TruncatedRecord {
                expected: location.offset + 1,
                available: file_len,
            });
        }

        file.seek(SeekFrom::Start(location.offset))?;
        let mut reader = BufReader::new(file);
        let record = Record::read_from(&mut reader, file_len - location.offset)?;

        if !record.is_live() {
            return Ok(ReadOutcome::Tombstone);
        }
        if record.key != key {
            return Ok(ReadOutcome::Collision);
        }
        Ok(ReadOutcome::Found(record.value))
    }

    fn scan_snapshot(&self) -> ScanAll {
        let snapshot = self.segments.read().snapshot();
        ScanAll::new(
            self.config.data_dir.clone(),
            self.config.file_extension.clone(),
            snapshot,
        )
    }
}
