//! Fully associative cache.
//!
//! The whole line address (word address with the word-in-line bits cleared)
//! is the tag, matched by a linear scan over every slot. A fill prefers the
//! first invalid slot; with all slots occupied it evicts a uniformly random
//! one. Random (not LRU) replacement is the modelled hardware's policy
//! and is preserved; the generator is a seedable xorshift so tests can pin
//! the victim sequence.

use super::Cache;
use crate::common::CacheMiss;
use crate::config::defaults::{LINE_BYTES, LINE_WORDS};

/// Tag value marking a free slot; real tags have the low two bits clear.
const INVALID_TAG: u32 = 0x0000_0001;

/// Default xorshift seed for the eviction generator.
const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Fully associative cache with 4-word lines and random eviction.
#[derive(Clone, Debug)]
pub struct AssociativeCache {
    data: Vec<u32>,
    tags: Vec<u32>,
    lines: usize,
    rng_state: u64,
}

impl AssociativeCache {
    /// Creates a fully associative cache with the default eviction seed.
    ///
    /// # Arguments
    ///
    /// * `size` - Capacity in bytes; a multiple of the 16-byte line size.
    pub fn new(size: usize) -> Self {
        Self::with_seed(size, DEFAULT_SEED)
    }

    /// Creates a fully associative cache with a caller-chosen eviction seed.
    ///
    /// # Arguments
    ///
    /// * `size` - Capacity in bytes.
    /// * `seed` - Nonzero xorshift state; fixing it makes the victim
    ///   sequence reproducible.
    pub fn with_seed(size: usize, seed: u64) -> Self {
        let lines = size / LINE_BYTES;
        let mut cache = Self {
            data: vec![0; size / 4],
            tags: vec![0; lines],
            lines,
            rng_state: if seed == 0 { DEFAULT_SEED } else { seed },
        };
        cache.reset();
        cache
    }

    /// Draws the next victim slot from the xorshift generator.
    fn random_victim(&mut self) -> usize {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x as usize) % self.lines
    }

    #[inline]
    fn line_tag(addr: u32) -> u32 {
        addr & 0xFFFF_FFFC
    }

    fn fill(&mut self, slot: usize, tag: u32, line: &[u32; LINE_WORDS]) {
        self.tags[slot] = tag;
        self.data[slot * LINE_WORDS..(slot + 1) * LINE_WORDS].copy_from_slice(line);
    }
}

impl Cache for AssociativeCache {
    fn read(&self, addr: u32) -> Result<u32, CacheMiss> {
        let tag = Self::line_tag(addr);
        let word_sel = (addr & 0x3) as usize;

        for (slot, &t) in self.tags.iter().enumerate() {
            if t == tag {
                return Ok(self.data[slot * LINE_WORDS + word_sel]);
            }
        }

        Err(CacheMiss::new(addr))
    }

    fn write_line(&mut self, addr: u32, line: &[u32; LINE_WORDS]) {
        let tag = Self::line_tag(addr);

        // Prefer a free slot; only a full cache pays an eviction.
        if let Some(slot) = self.tags.iter().position(|&t| t == INVALID_TAG) {
            self.fill(slot, tag, line);
            return;
        }

        let victim = self.random_victim();
        self.fill(victim, tag, line);
    }

    fn write_word(&mut self, addr: u32, word: u32) -> Result<(), CacheMiss> {
        let tag = Self::line_tag(addr);
        let word_sel = (addr & 0x3) as usize;

        for (slot, &t) in self.tags.iter().enumerate() {
            if t == tag {
                self.data[slot * LINE_WORDS + word_sel] = word;
                return Ok(());
            }
        }

        Err(CacheMiss::new(addr))
    }

    fn invalidate_line_by_addr(&mut self, addr: u32) {
        let tag = Self::line_tag(addr);

        if let Some(slot) = self.tags.iter().position(|&t| t == tag) {
            self.tags[slot] = INVALID_TAG;
        }
    }

    fn reset(&mut self) {
        self.tags.fill(INVALID_TAG);
    }
}
