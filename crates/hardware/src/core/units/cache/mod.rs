//! Line caches.
//!
//! A fixed-line-size (4 word) cache behind one interface with three
//! interchangeable organisations:
//!
//! - [`DirectCache`]: one candidate line per index, O(1) lookup.
//! - [`AssociativeCache`]: full tag scan, uniform-random eviction.
//! - [`SetAssociativeCache`]: N direct-mapped ways with a per-index
//!   round-robin fill counter.
//!
//! Addresses are WORD addresses (byte address >> 2); the low two bits
//! select the word within the line. A lookup that does not find its line
//! returns [`CacheMiss`], a routine outcome the bus sequencer converts
//! into a line fill, never an error.

/// Fully associative cache with random eviction.
pub mod associative;
/// Direct-mapped cache.
pub mod direct;
/// N-way set-associative cache composed of direct-mapped ways.
pub mod set_assoc;

pub use associative::AssociativeCache;
pub use direct::DirectCache;
pub use set_assoc::SetAssociativeCache;

use crate::common::CacheMiss;
use crate::config::{CacheKind, defaults::LINE_WORDS};

/// Interface shared by every cache organisation.
///
/// The wrapper's bus sequencer is the only caller; the core never touches
/// the caches directly.
pub trait Cache: std::fmt::Debug + Send {
    /// Reads one word.
    ///
    /// # Arguments
    ///
    /// * `addr` - Word address.
    ///
    /// # Returns
    ///
    /// The cached word, or [`CacheMiss`] if the line is not resident.
    fn read(&self, addr: u32) -> Result<u32, CacheMiss>;

    /// Installs a full line, evicting per the organisation's policy.
    ///
    /// # Arguments
    ///
    /// * `addr` - Word address of the first word in the line.
    /// * `line` - The line contents.
    fn write_line(&mut self, addr: u32, line: &[u32; LINE_WORDS]);

    /// Updates one word of an already-resident line.
    ///
    /// # Arguments
    ///
    /// * `addr` - Word address.
    /// * `word` - The new word value.
    ///
    /// # Returns
    ///
    /// [`CacheMiss`] if the line is not resident; write-through callers
    /// skip the cache patch in that case.
    fn write_word(&mut self, addr: u32, word: u32) -> Result<(), CacheMiss>;

    /// Evicts the line containing the address, if resident.
    fn invalidate_line_by_addr(&mut self, addr: u32);

    /// Invalidates every line.
    fn reset(&mut self);
}

/// Builds a cache of the configured organisation.
///
/// # Arguments
///
/// * `kind` - The cache organisation.
/// * `size` - Capacity in bytes.
/// * `ways` - Associativity; only used by [`CacheKind::SetAssociative`].
///
/// # Returns
///
/// The boxed cache.
pub fn build_cache(kind: CacheKind, size: usize, ways: usize) -> Box<dyn Cache> {
    match kind {
        CacheKind::Direct => Box::new(DirectCache::new(size)),
        CacheKind::Associative => Box::new(AssociativeCache::new(size)),
        CacheKind::SetAssociative => Box::new(SetAssociativeCache::new(size, ways)),
    }
}
