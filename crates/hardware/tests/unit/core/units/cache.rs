//! Cache Tests.
//!
//! Addresses below are WORD addresses; a 4-word line spans four
//! consecutive word addresses with a 16-byte-aligned base. The three
//! organisations share the idempotence and invalidation contracts and
//! differ in eviction: always-overwrite (direct), per-index round-robin
//! (set-associative) and seeded-random (associative).

use arm7_core::core::units::cache::{
    AssociativeCache, Cache, DirectCache, SetAssociativeCache,
};
use pretty_assertions::assert_eq;

const LINE: [u32; 4] = [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444];

fn caches() -> Vec<Box<dyn Cache>> {
    vec![
        Box::new(DirectCache::new(1024)),
        Box::new(AssociativeCache::new(1024)),
        Box::new(SetAssociativeCache::new(1024, 4)),
    ]
}

// ─── Shared contracts ────────────────────────────────────────────────────────

/// Writing a line then reading any word of it returns the written value.
#[test]
fn write_line_then_read_every_word() {
    for mut cache in caches() {
        cache.write_line(0x40, &LINE);
        for (i, &word) in LINE.iter().enumerate() {
            assert_eq!(cache.read(0x40 + i as u32), Ok(word));
        }
    }
}

/// A fresh cache misses everywhere.
#[test]
fn fresh_cache_misses() {
    for cache in caches() {
        assert!(cache.read(0).is_err());
        assert!(cache.read(0x40).is_err());
    }
}

/// Invalidating a line makes every word of it miss again.
#[test]
fn invalidate_line_by_addr_evicts() {
    for mut cache in caches() {
        cache.write_line(0x40, &LINE);
        cache.invalidate_line_by_addr(0x41);
        for i in 0..4 {
            assert!(cache.read(0x40 + i).is_err());
        }
    }
}

/// Invalidating an absent line is a no-op.
#[test]
fn invalidate_absent_line_is_noop() {
    for mut cache in caches() {
        cache.write_line(0x40, &LINE);
        cache.invalidate_line_by_addr(0x80);
        assert_eq!(cache.read(0x40), Ok(LINE[0]));
    }
}

/// write_word updates a resident line and misses otherwise.
#[test]
fn write_word_patches_resident_lines_only() {
    for mut cache in caches() {
        cache.write_line(0x40, &LINE);
        assert!(cache.write_word(0x42, 0xAAAA_AAAA).is_ok());
        assert_eq!(cache.read(0x42), Ok(0xAAAA_AAAA));
        assert!(cache.write_word(0x142, 0xBBBB_BBBB).is_err());
    }
}

/// reset invalidates everything.
#[test]
fn reset_invalidates_all() {
    for mut cache in caches() {
        cache.write_line(0x40, &LINE);
        cache.write_line(0x80, &LINE);
        cache.reset();
        assert!(cache.read(0x40).is_err());
        assert!(cache.read(0x80).is_err());
    }
}

/// Overfilling any organisation evicts something.
#[test]
fn overfill_evicts_some_line() {
    for mut cache in caches() {
        // 1024 bytes = 64 lines; install 65 distinct ones.
        for i in 0..65u32 {
            cache.write_line(i * 4, &[i, i, i, i]);
        }
        let resident = (0..65u32)
            .filter(|&i| cache.read(i * 4).is_ok())
            .count();
        assert!(resident <= 64, "no eviction happened");
    }
}

// ─── Direct-mapped ───────────────────────────────────────────────────────────

/// Two addresses mapping to the same index displace each other.
#[test]
fn direct_conflicting_tags_displace() {
    let mut cache = DirectCache::new(1024);
    // 64 lines: word addresses 0x40 and 0x40 + 64*4 share index 0x10.
    cache.write_line(0x40, &LINE);
    cache.write_line(0x40 + 64 * 4, &[9, 9, 9, 9]);

    assert!(cache.read(0x40).is_err());
    assert_eq!(cache.read(0x40 + 64 * 4), Ok(9));
}

// ─── Set-associative ─────────────────────────────────────────────────────────

/// Conflicting lines fill the ways round-robin; way capacity + 1 evicts
/// the first victim in installation order.
#[test]
fn set_assoc_round_robin_victims() {
    // 2-way, 512 bytes => 256 per way => 16 lines per way.
    let mut cache = SetAssociativeCache::new(512, 2);
    let stride = 16 * 4; // word-address distance mapping to the same index

    cache.write_line(0, &[1, 1, 1, 1]); // way 0
    cache.write_line(stride, &[2, 2, 2, 2]); // way 1
    assert_eq!(cache.read(0), Ok(1));
    assert_eq!(cache.read(stride), Ok(2));

    // Third conflicting line goes back to way 0, evicting the first.
    cache.write_line(2 * stride, &[3, 3, 3, 3]);
    assert!(cache.read(0).is_err());
    assert_eq!(cache.read(stride), Ok(2));
    assert_eq!(cache.read(2 * stride), Ok(3));

    // And a fourth takes way 1.
    cache.write_line(3 * stride, &[4, 4, 4, 4]);
    assert!(cache.read(stride).is_err());
    assert_eq!(cache.read(2 * stride), Ok(3));
    assert_eq!(cache.read(3 * stride), Ok(4));
}

/// The round-robin counters are per index.
#[test]
fn set_assoc_round_robin_is_per_index() {
    let mut cache = SetAssociativeCache::new(512, 2);
    let stride = 16 * 4;

    // Two fills at index 0, one at index 1.
    cache.write_line(0, &[1, 1, 1, 1]);
    cache.write_line(stride, &[2, 2, 2, 2]);
    cache.write_line(4, &[5, 5, 5, 5]);

    // Index 1's counter is independent: the next index-1 fill lands in
    // way 1 without evicting the index-1 line in way 0.
    cache.write_line(stride + 4, &[6, 6, 6, 6]);
    assert_eq!(cache.read(4), Ok(5));
    assert_eq!(cache.read(stride + 4), Ok(6));
}

// ─── Associative ─────────────────────────────────────────────────────────────

/// A full associative cache under a fixed seed evicts reproducibly.
#[test]
fn associative_eviction_is_seed_reproducible() {
    let survivors = |seed: u64| -> Vec<u32> {
        let mut cache = AssociativeCache::with_seed(256, seed); // 16 lines
        for i in 0..20u32 {
            cache.write_line(i * 4, &[i, i, i, i]);
        }
        (0..20u32).filter(|&i| cache.read(i * 4).is_ok()).collect()
    };

    let a = survivors(42);
    let b = survivors(42);
    assert_eq!(a, b, "same seed must evict the same victims");
    assert!(a.len() <= 16);
}

/// Fills prefer free slots: no eviction happens until capacity.
#[test]
fn associative_prefers_free_slots() {
    let mut cache = AssociativeCache::with_seed(256, 7); // 16 lines
    for i in 0..16u32 {
        cache.write_line(i * 4, &[i, i, i, i]);
    }
    for i in 0..16u32 {
        assert_eq!(cache.read(i * 4), Ok(i));
    }
}
