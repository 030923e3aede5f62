//! Robin-hood hash table
//!
//! Open-addressing table keyed by precomputed 64-bit hashes.

use std::mem;

use crate::error::{DynaError, Result};

/// Grow once occupancy would exceed LOAD_FACTOR_NUM / LOAD_FACTOR_DEN
const LOAD_FACTOR_NUM: usize = 85;
const LOAD_FACTOR_DEN: usize = 100;

#[derive(Debug, Clone)]
struct Slot<V> {
    hash: u64,
    value: V,
    /// Distance from the slot's home position
    probe_distance: usize,
}

/// Hash table with robin-hood insertion and backward-shift deletion
#[derive(Debug, Clone)]
pub struct RobinHoodIndex<V> {
    slots: Vec<Option<Slot<V>>>,
    len: usize,
}

impl<V> RobinHoodIndex<V> {
    /// Create an empty table with `capacity` slots (must be at least 1)
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DynaError::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: Self::empty_slots(capacity),
            len: 0,
        })
    }

    /// Insert or update the value for `hash`, returning the previous value
    pub fn put(&mut self, hash: u64, value: V) -> Option<V> {
        if let Some(pos) = self.find(hash) {
            if let Some(slot) = self.slots[pos].as_mut() {
                return Some(mem::replace(&mut slot.value, value));
            }
        }

        if (self.len + 1) * LOAD_FACTOR_DEN > self.capacity() * LOAD_FACTOR_NUM {
            self.grow();
        }

        self.insert_new(Slot {
            hash,
            value,
            probe_distance: 0,
        });
        self.len += 1;
        None
    }

    /// Look up the value stored for `hash`
    pub fn get(&self, hash: u64) -> Option<&V> {
        self.find(hash)
            .and_then(|pos| self.slots[pos].as_ref())
            .map(|slot| &slot.value)
    }

    /// Whether `hash` has an entry
    pub fn contains(&self, hash: u64) -> bool {
        self.find(hash).is_some()
    }

    /// Remove the entry for `hash`; true if one existed
    pub fn erase(&mut self, hash: u64) -> bool {
        self.remove(hash).is_some()
    }

    /// Remove the entry for `hash`, returning its value
    pub fn remove(&mut self, hash: u64) -> Option<V> {
        let mut hole = self.find(hash)?;
        let removed = self.slots[hole].take()?;
        self.len -= 1;

        // Backward shift: pull displaced successors one slot closer to home
        let cap = self.capacity();
        let mut next = (hole + 1) % cap;
        while let Some(slot) = self.slots[next].as_mut() {
            if slot.probe_distance == 0 {
                break;
            }
            slot.probe_distance -= 1;
            self.slots[hole] = self.slots[next].take();
            hole = next;
            next = (next + 1) % cap;
        }

        Some(removed.value)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Longest displacement currently in the table
    pub fn max_probe_distance(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .map(|slot| slot.probe_distance)
            .max()
            .unwrap_or(0)
    }

    /// Iterate `(hash, value)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        self.slots
            .iter()
            .flatten()
            .map(|slot| (slot.hash, &slot.value))
    }

    /// Remove every entry, keeping the current capacity
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn empty_slots(capacity: usize) -> Vec<Option<Slot<V>>> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        slots
    }

    fn home(&self, hash: u64) -> usize {
        (hash % self.capacity() as u64) as usize
    }

    /// Slot position holding `hash`, if any
    fn find(&self, hash: u64) -> Option<usize> {
        let cap = self.capacity();
        let mut pos = self.home(hash);

        for probes in 0..cap {
            match &self.slots[pos] {
                None => return None,
                // Robin-hood early exit: `hash` would have claimed this slot
                Some(slot) if slot.probe_distance < probes => return None,
                Some(slot) if slot.hash == hash => return Some(pos),
                Some(_) => {}
            }
            pos = (pos + 1) % cap;
        }

        None
    }

    /// Place a slot whose hash is known to be absent. Requires a free slot.
    fn insert_new(&mut self, mut incoming: Slot<V>) {
        let cap = self.capacity();
        let mut pos = self.home(incoming.hash);

        loop {
            match self.slots[pos].as_mut() {
                None => {
                    self.slots[pos] = Some(incoming);
                    return;
                }
                Some(resident) => {
                    if resident.probe_distance < incoming.probe_distance {
                        mem::swap(resident, &mut incoming);
                    }
                }
            }
            pos = (pos + 1) % cap;
            incoming.probe_distance += 1;
        }
    }

    /// Double the slot count and reinsert entries in their current order
    fn grow(&mut self) {
        let new_cap = self.capacity() * 2;
        let old = mem::replace(&mut self.slots, Self::empty_slots(new_cap));

        tracing::trace!(capacity = new_cap, entries = self.len, "Growing hash index");

        for mut slot in old.into_iter().flatten() {
            slot.probe_distance = 0;
            self.insert_new(slot);
        }
    }
}
