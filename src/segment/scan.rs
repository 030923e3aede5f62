//! Segment scanning
//!
//! Sequential iteration over the records of one segment, and over every
//! segment of a snapshot.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{DynaError, Result};
use crate::record::{compute_crc, decode_body, decode_header, Record};

use super::{segment_path, SegmentInfo, SegmentLocation};

/// A record read during a scan, with where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub location: SegmentLocation,
    pub record: Record,
    /// On-disk size, length prefix included
    pub len: u64,
}

/// A framed record whose checksum did not match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamagedRecord {
    pub location: SegmentLocation,
    /// Key as stored; it may itself be one of the damaged bytes
    pub key: Vec<u8>,
}

/// Reads the records of a single segment, front to back, up to `limit` bytes.
///
/// - A CRC mismatch is yielded as an error and the reader skips past the
///   record using its declared length. The damaged record is kept for
///   `take_damaged`.
/// - A truncated record or an inconsistent header ends the iteration after
///   being yielded, since nothing after it can be framed.
pub struct SegmentReader {
    reader: BufReader<File>,
    segment_id: u32,
    /// Offset of the next record
    position: u64,
    /// Stop reading at this offset
    limit: u64,
    done: bool,
    damaged: Option<DamagedRecord>,
}

impl SegmentReader {
    /// Open a segment for scanning up to `limit` bytes
    pub fn open(path: &Path, segment_id: u32, limit: u64) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            segment_id,
            position: 0,
            limit,
            done: false,
            damaged: None,
        })
    }

    /// Open a segment and scan all of its current bytes
    pub fn open_full(path: &Path, segment_id: u32) -> Result<Self> {
        let limit = std::fs::metadata(path)?.len();
        Self::open(path, segment_id, limit)
    }

    /// Offset just past the last record read successfully or skipped
    pub fn offset(&self) -> u64 {
        self.position
    }

    /// Segment being read
    pub fn segment_id(&self) -> u32 {
        self.segment_id
    }

    /// The record behind the last `CrcMismatch` yielded, if not taken yet
    pub fn take_damaged(&mut self) -> Option<DamagedRecord> {
        self.damaged.take()
    }

    fn read_next(&mut self) -> Result<ScannedRecord> {
        let location = SegmentLocation::new(self.segment_id, self.position);
        let available = self.limit - self.position;

        let header = decode_header(&mut self.reader)?;
        let len = header.total_len();
        if len > available {
            return Err(DynaError::TruncatedRecord {
                expected: len,
                available,
            });
        }

        let body = decode_body(&mut self.reader, header.key_len, header.val_len)?;
        // The record is framed; whatever its checksum says, the next one starts here
        self.position += len;

        let computed = compute_crc(&header, &body.key, &body.value);
        if computed != body.stored_crc {
            self.damaged = Some(DamagedRecord {
                location,
                key: body.key,
            });
            return Err(DynaError::CrcMismatch {
                stored: body.stored_crc,
                computed,
            });
        }

        Ok(ScannedRecord {
            location,
            record: Record {
                key: body.key,
                value: body.value,
                flags: header.flags,
            },
            len,
        })
    }
}

impl Iterator for SegmentReader {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.position >= self.limit {
            return None;
        }
        self.damaged = None;

        match self.read_next() {
            Ok(record) => Some(Ok(record)),
            Err(e @ DynaError::CrcMismatch { .. }) => Some(Err(e)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazy scan over every live record of a set of segments.
///
/// Segments are visited in the order given, each up to its snapshotted
/// length, so records appended after the snapshot are never seen half
/// written. Records are not de-duplicated: an updated key shows up once per
/// live version.
pub struct ScanAll {
    dir: PathBuf,
    extension: String,
    pending: VecDeque<SegmentInfo>,
    current: Option<SegmentReader>,
}

impl ScanAll {
    pub fn new(dir: PathBuf, extension: String, segments: Vec<SegmentInfo>) -> Self {
        Self {
            dir,
            extension,
            pending: segments.into(),
            current: None,
        }
    }
}

impl Iterator for ScanAll {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let info = self.pending.pop_front()?;
                let path = segment_path(&self.dir, info.id, &self.extension);
                match SegmentReader::open(&path, info.id, info.len) {
                    Ok(reader) => self.current = Some(reader),
                    Err(e) => return Some(Err(e)),
                }
            }

            let reader = self.current.as_mut()?;
            match reader.next() {
                None => self.current = None,
                Some(Ok(scanned)) if scanned.record.is_live() => return Some(Ok(scanned)),
                Some(Ok(_)) => {}
                Some(Err(e)) if e.is_corruption() => {
                    tracing::warn!(
                        segment_id = reader.segment_id(),
                        offset = reader.offset(),
                        "Skipping damaged record during scan: {}",
                        e
                    );
                }
                Some(Err(e)) => {
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
