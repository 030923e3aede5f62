//! Index Module
//!
//! In-memory map from a key's 64-bit hash to its latest on-disk location.
//!
//! ## Responsibilities
//! - O(1) amortized put/get/erase keyed by hash
//! - Bounded probe lengths through robin-hood displacement
//! - No index-level tombstones: deletes backward-shift the probe chain
//!
//! ## Data Structure Choice
//! Open addressing with linear probing. On insert, an entry that sits farther
//! from its home slot takes the slot from one that sits closer; lookups stop
//! as soon as they meet an entry closer to home than the probe count.
//!
//! The index holds one location per *hash*, not per key. Two keys sharing a
//! hash overwrite each other here; the engine's read path compares the stored
//! key and reports a collision as absent.

mod robin_hood;

pub use robin_hood::RobinHoodIndex;

use crate::segment::SegmentLocation;

/// The engine's index: key hash → most recent segment location
pub type HashIndex = RobinHoodIndex<SegmentLocation>;
