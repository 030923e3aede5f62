//! Tests for the robin-hood hash index
//!
//! These tests verify:
//! - Basic put/get/erase semantics
//! - Growth past the load factor from a tiny capacity
//! - Robin-hood displacement and backward-shift deletion
//! - Agreement with std HashMap under a mixed workload

use std::collections::HashMap;

use dynakv::index::RobinHoodIndex;
use dynakv::DynaError;

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_zero_capacity_rejected() {
    let result = RobinHoodIndex::<u64>::with_capacity(0);
    assert!(matches!(result, Err(DynaError::InvalidCapacity(0))));
}

#[test]
fn test_new_index_is_empty() {
    let index = RobinHoodIndex::<u64>::with_capacity(8).unwrap();

    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert_eq!(index.capacity(), 8);
    assert_eq!(index.get(42), None);
}

#[test]
fn test_capacity_one_grows() {
    let mut index = RobinHoodIndex::with_capacity(1).unwrap();

    for h in 0..10u64 {
        index.put(h, h * 10);
    }

    assert_eq!(index.len(), 10);
    for h in 0..10u64 {
        assert_eq!(index.get(h), Some(&(h * 10)));
    }
}

// =============================================================================
// Basic Operation Tests
// =============================================================================

#[test]
fn test_put_get() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();

    assert_eq!(index.put(7, "seven"), None);
    assert_eq!(index.put(9, "nine"), None);

    assert_eq!(index.get(7), Some(&"seven"));
    assert_eq!(index.get(9), Some(&"nine"));
    assert!(index.contains(7));
    assert!(!index.contains(8));
    assert_eq!(index.len(), 2);
}

#[test]
fn test_put_overwrites_in_place() {
    let mut index = RobinHoodIndex::with_capacity(4).unwrap();

    index.put(1, 100);
    let capacity = index.capacity();
    assert_eq!(index.put(1, 200), Some(100));

    assert_eq!(index.get(1), Some(&200));
    assert_eq!(index.len(), 1);
    assert_eq!(index.capacity(), capacity);
}

#[test]
fn test_erase() {
    let mut index = RobinHoodIndex::with_capacity(8).unwrap();
    index.put(3, 30);

    assert!(index.erase(3));
    assert_eq!(index.get(3), None);
    assert!(!index.erase(3));
    assert!(index.is_empty());
}

#[test]
fn test_remove_returns_value() {
    let mut index = RobinHoodIndex::with_capacity(8).unwrap();
    index.put(5, 55);

    assert_eq!(index.remove(5), Some(55));
    assert_eq!(index.remove(5), None);
}

#[test]
fn test_clear_keeps_capacity() {
    let mut index = RobinHoodIndex::with_capacity(8).unwrap();
    for h in 0..5u64 {
        index.put(h, h);
    }
    let capacity = index.capacity();

    index.clear();

    assert!(index.is_empty());
    assert_eq!(index.capacity(), capacity);
    assert_eq!(index.get(1), None);
}

// =============================================================================
// Resize Tests
// =============================================================================

#[test]
fn test_resize_with_interleaved_deletes() {
    let mut index = RobinHoodIndex::with_capacity(3).unwrap();

    for i in 0..100u64 {
        index.put(i, i + 1);
    }
    assert_eq!(index.len(), 100);
    assert!(index.capacity() >= 100);

    for i in 30..70u64 {
        assert!(index.erase(i));
    }
    assert_eq!(index.len(), 60);

    for i in 0..100u64 {
        if (30..70).contains(&i) {
            assert_eq!(index.get(i), None, "hash {} should be gone", i);
        } else {
            assert_eq!(index.get(i), Some(&(i + 1)), "hash {} should be present", i);
        }
    }
}

#[test]
fn test_load_factor_respected() {
    let mut index = RobinHoodIndex::with_capacity(4).unwrap();

    for i in 0..1000u64 {
        index.put(i.wrapping_mul(0x9E3779B97F4A7C15), i);
        assert!(index.len() * 100 <= index.capacity() * 85);
    }
}

#[test]
fn test_iter_visits_every_entry() {
    let mut index = RobinHoodIndex::with_capacity(3).unwrap();
    for i in 0..50u64 {
        index.put(i * 3, i);
    }

    let mut seen: Vec<u64> = index.iter().map(|(h, _)| h).collect();
    seen.sort_unstable();
    let expected: Vec<u64> = (0..50u64).map(|i| i * 3).collect();

    assert_eq!(seen, expected);
}

// =============================================================================
// Robin-Hood Behavior Tests
// =============================================================================

#[test]
fn test_shared_home_slot_chain() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();

    // All three land on home slot 0
    index.put(0, 'a');
    index.put(16, 'b');
    index.put(32, 'c');

    assert_eq!(index.max_probe_distance(), 2);
    assert_eq!(index.get(0), Some(&'a'));
    assert_eq!(index.get(16), Some(&'b'));
    assert_eq!(index.get(32), Some(&'c'));
}

#[test]
fn test_backward_shift_after_erase() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();
    index.put(0, 'a');
    index.put(16, 'b');
    index.put(32, 'c');

    assert!(index.erase(0));

    // Successors moved one slot closer to home
    assert_eq!(index.max_probe_distance(), 1);
    assert_eq!(index.get(16), Some(&'b'));
    assert_eq!(index.get(32), Some(&'c'));
    assert_eq!(index.get(0), None);
}

#[test]
fn test_backward_shift_stops_at_home_entry() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();
    index.put(0, 'a'); // slot 0
    index.put(16, 'b'); // slot 1, distance 1
    index.put(2, 'c'); // slot 2, at home

    assert!(index.erase(0));

    assert_eq!(index.get(16), Some(&'b'));
    assert_eq!(index.get(2), Some(&'c'));
    assert_eq!(index.max_probe_distance(), 0);
}

#[test]
fn test_displacement_steals_from_closer_entry() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();
    index.put(0, 0); // slot 0
    index.put(1, 1); // slot 1
    index.put(16, 16); // home 0

    // Hash 16 reaches slot 1 at distance 1 where hash 1 sits at distance 0,
    // so it takes the slot and hash 1 moves to slot 2 at distance 1.
    assert_eq!(index.max_probe_distance(), 1);
    for h in [0u64, 1, 16] {
        assert_eq!(index.get(h), Some(&h));
    }
}

#[test]
fn test_absent_lookup_in_crowded_table() {
    let mut index = RobinHoodIndex::with_capacity(64).unwrap();
    for i in 0..40u64 {
        index.put(i * 64, i); // every entry shares home slot 0
    }

    assert_eq!(index.get(41 * 64), None);
    assert_eq!(index.get(1), None);
}

#[test]
fn test_wraparound_probe() {
    let mut index = RobinHoodIndex::with_capacity(16).unwrap();
    index.put(15, 'x'); // last slot
    index.put(31, 'y'); // home 15, wraps to slot 0
    index.put(47, 'z'); // home 15, wraps to slot 1

    assert_eq!(index.get(31), Some(&'y'));
    assert_eq!(index.get(47), Some(&'z'));

    assert!(index.erase(15));
    assert_eq!(index.get(31), Some(&'y'));
    assert_eq!(index.get(47), Some(&'z'));
    assert_eq!(index.max_probe_distance(), 1);
}

// =============================================================================
// Model Comparison Tests
// =============================================================================

#[test]
fn test_matches_hashmap_under_mixed_workload() {
    let mut index = RobinHoodIndex::with_capacity(3).unwrap();
    let mut model: HashMap<u64, u64> = HashMap::new();

    // Small key space so puts, updates and erases collide often
    let mut state: u64 = 0x1234_5678;
    for step in 0..20_000u64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let hash = (state >> 33) % 512;

        if state % 3 == 0 {
            assert_eq!(index.erase(hash), model.remove(&hash).is_some());
        } else {
            assert_eq!(index.put(hash, step), model.insert(hash, step));
        }
    }

    assert_eq!(index.len(), model.len());
    for hash in 0..512u64 {
        assert_eq!(index.get(hash), model.get(&hash));
    }
}
