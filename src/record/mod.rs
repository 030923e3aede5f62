//! Record Module
//!
//! The fixed-layout binary record every segment file is made of.
//!
//! ## Record Format (little-endian)
//! ```text
//! ┌────────────┬────────────┬────────────┬─────────┬────────────┬─────┬───────┬─────────┐
//! │RecordLen(4)│ KeyLen (4) │ ValLen (4) │Flags (1)│Reserved (1)│ Key │ Value │ CRC (4) │
//! └────────────┴────────────┴────────────┴─────────┴────────────┴─────┴───────┴─────────┘
//!              └──────────────────── CRC32 payload ─────────────────────────┘
//!              └──────────────────────────── RecordLen ───────────────────────────────┘
//! ```
//!
//! - `RecordLen` counts every byte after itself, CRC included.
//! - `Flags`: 0 = tombstone, non-zero (1) = live. A live record may carry an
//!   empty value, so liveness is read from `Flags`, never from `ValLen`.

mod codec;

pub use codec::{
    compute_crc, decode_body, decode_header, encode, verify_crc, Record, RecordBody, RecordHeader,
};

// =============================================================================
// Shared Constants
// =============================================================================

/// Size of the `RecordLen` prefix
pub const LEN_PREFIX_SIZE: u64 = 4;

/// Full header: RecordLen (4) + KeyLen (4) + ValLen (4) + Flags (1) + Reserved (1)
pub const HEADER_SIZE: u64 = 14;

/// Trailing checksum size
pub const CRC_SIZE: u64 = 4;

/// Fixed bytes counted by `RecordLen` besides key and value
pub const FIXED_BODY_SIZE: u64 = HEADER_SIZE - LEN_PREFIX_SIZE + CRC_SIZE;

/// Flags value of a tombstone
pub const FLAG_TOMBSTONE: u8 = 0;

/// Canonical flags value of a live record
pub const FLAG_LIVE: u8 = 1;
