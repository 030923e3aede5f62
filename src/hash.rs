//! Key hashing
//!
//! 64-bit FNV-1a. Not cryptographic; the index keys on this value and the
//! read path re-checks the literal key to reject collisions.

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Hash a key with 64-bit FNV-1a
pub fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
