//! Record codec
//!
//! Encoding and decoding of single records, with CRC verification.

use std::io::{self, Read};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DynaError, Result};

use super::{FIXED_BODY_SIZE, FLAG_TOMBSTONE, HEADER_SIZE, LEN_PREFIX_SIZE};

/// Decoded fixed-size header of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Bytes following the length prefix, CRC included
    pub record_len: u32,
    pub key_len: u32,
    pub val_len: u32,
    pub flags: u8,
    pub reserved: u8,
}

impl RecordHeader {
    /// Total on-disk size of the record, length prefix included
    pub fn total_len(&self) -> u64 {
        LEN_PREFIX_SIZE + self.record_len as u64
    }

    /// Whether the record is live (anything but a tombstone)
    pub fn is_live(&self) -> bool {
        self.flags != FLAG_TOMBSTONE
    }

    /// The header bytes covered by the CRC (everything after `record_len`)
    fn crc_prefix(&self) -> [u8; 10] {
        let mut out = [0u8; 10];
        let mut buf = &mut out[..];
        buf.put_u32_le(self.key_len);
        buf.put_u32_le(self.val_len);
        buf.put_u8(self.flags);
        buf.put_u8(self.reserved);
        out
    }
}

/// Key, value and stored checksum read after a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBody {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub stored_crc: u32,
}

/// A fully decoded and verified record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub flags: u8,
}

impl Record {
    /// Whether the record is live (anything but a tombstone)
    pub fn is_live(&self) -> bool {
        self.flags != FLAG_TOMBSTONE
    }

    /// Read one record from `reader` and verify its checksum.
    ///
    /// `available` is the number of bytes known to be readable from the
    /// current position; a header claiming more than that is reported as
    /// truncated before anything is allocated for the body.
    pub fn read_from<R: Read>(reader: &mut R, available: u64) -> Result<Self> {
        let header = decode_header(reader)?;

        if header.total_len() > available {
            return Err(DynaError::TruncatedRecord {
                expected: header.total_len(),
                available,
            });
        }

        let body = decode_body(reader, header.key_len, header.val_len)?;

        let computed = compute_crc(&header, &body.key, &body.value);
        if computed != body.stored_crc {
            return Err(DynaError::CrcMismatch {
                stored: body.stored_crc,
                computed,
            });
        }

        Ok(Self {
            key: body.key,
            value: body.value,
            flags: header.flags,
        })
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a record, length prefix and trailing CRC included.
///
/// A tombstone (`flags == 0`) must not carry a value.
pub fn encode(key: &[u8], value: &[u8], flags: u8) -> Result<Bytes> {
    if flags == FLAG_TOMBSTONE && !value.is_empty() {
        return Err(DynaError::InvalidRecord(
            "tombstone cannot carry a value".to_string(),
        ));
    }

    let key_len = u32::try_from(key.len()).map_err(|_| DynaError::RecordTooLarge {
        field: "key",
        len: key.len(),
    })?;
    let val_len = u32::try_from(value.len()).map_err(|_| DynaError::RecordTooLarge {
        field: "value",
        len: value.len(),
    })?;

    let body_len = FIXED_BODY_SIZE + key.len() as u64 + value.len() as u64;
    let record_len = u32::try_from(body_len).map_err(|_| DynaError::RecordTooLarge {
        field: "record",
        len: body_len as usize,
    })?;

    let mut buf = BytesMut::with_capacity((LEN_PREFIX_SIZE + body_len) as usize);
    buf.put_u32_le(record_len);
    buf.put_u32_le(key_len);
    buf.put_u32_le(val_len);
    buf.put_u8(flags);
    buf.put_u8(0); // reserved
    buf.put_slice(key);
    buf.put_slice(value);

    let crc = crc32fast::hash(&buf[LEN_PREFIX_SIZE as usize..]);
    buf.put_u32_le(crc);

    Ok(buf.freeze())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode the 14-byte header at the reader's position.
///
/// Fails with `TruncatedRecord` on a short read and with `InvalidRecord` if
/// `record_len` disagrees with the key and value lengths.
pub fn decode_header<R: Read>(reader: &mut R) -> Result<RecordHeader> {
    let mut raw = [0u8; HEADER_SIZE as usize];
    let n = read_full(reader, &mut raw)?;
    if n < raw.len() {
        return Err(DynaError::TruncatedRecord {
            expected: HEADER_SIZE,
            available: n as u64,
        });
    }

    let mut buf = &raw[..];
    let header = RecordHeader {
        record_len: buf.get_u32_le(),
        key_len: buf.get_u32_le(),
        val_len: buf.get_u32_le(),
        flags: buf.get_u8(),
        reserved: buf.get_u8(),
    };

    let expected = FIXED_BODY_SIZE + header.key_len as u64 + header.val_len as u64;
    if header.record_len as u64 != expected {
        return Err(DynaError::InvalidRecord(format!(
            "record_len {} does not match key_len {} + val_len {}",
            header.record_len, header.key_len, header.val_len
        )));
    }

    Ok(header)
}

/// Read key, value and stored CRC following a header.
pub fn decode_body<R: Read>(reader: &mut R, key_len: u32, val_len: u32) -> Result<RecordBody> {
    let expected = key_len as u64 + val_len as u64 + super::CRC_SIZE;

    let mut key = vec![0u8; key_len as usize];
    let mut read = read_full(reader, &mut key)?;

    let mut value = vec![0u8; val_len as usize];
    if read == key.len() {
        read += read_full(reader, &mut value)?;
    }

    let mut crc = [0u8; 4];
    if read == key.len() + value.len() {
        read += read_full(reader, &mut crc)?;
    }

    if (read as u64) < expected {
        return Err(DynaError::TruncatedRecord {
            expected,
            available: read as u64,
        });
    }

    Ok(RecordBody {
        key,
        value,
        stored_crc: u32::from_le_bytes(crc),
    })
}

/// CRC32 of the payload described by `header`, `key` and `value`
pub fn compute_crc(header: &RecordHeader, key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&header.crc_prefix());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Check a contiguous payload (bytes between `record_len` and the CRC)
pub fn verify_crc(payload: &[u8], stored_crc: u32) -> bool {
    crc32fast::hash(payload) == stored_crc
}

/// Like `read_exact`, but reports how much was read instead of failing at EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DynaError::Io(e)),
        }
    }
    Ok(filled)
}
