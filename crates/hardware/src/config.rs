//! Configuration system for the ARM7 simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (caches, bus penalty, memory).
//! 2. **Structures:** Hierarchical config for caches, bus and driver memory.
//! 3. **Enums:** Cache organisation selection.
//!
//! Configuration is supplied as JSON via the CLI `--config` flag or built
//! programmatically; use `Config::default()` for the stock machine.

use serde::Deserialize;

/// Default configuration constants for the simulator.
pub mod defaults {
    /// Instruction cache capacity in bytes.
    pub const ICACHE_SIZE: usize = 1024;

    /// Data cache capacity in bytes.
    pub const DCACHE_SIZE: usize = 1024;

    /// Ways in the default set-associative cache organisation.
    pub const CACHE_WAYS: usize = 4;

    /// Cache line length in words. Lines are 16 bytes everywhere; the line
    /// fill state machine and the caches both assume this geometry.
    pub const LINE_WORDS: usize = 4;

    /// Cache line length in bytes.
    pub const LINE_BYTES: usize = LINE_WORDS * 4;

    /// The number of processor cycles one external bus beat costs.
    ///
    /// A line fill therefore costs `BUS_SPEED` for bus acquisition plus
    /// `BUS_SPEED` per word; a write-through store costs `2 * BUS_SPEED`.
    pub const BUS_SPEED: u64 = 10;

    /// Driver memory size in bytes (4 MiB).
    pub const MEMORY_SIZE: usize = 4 * 1024 * 1024;

    /// Entries in the SWI callback table.
    pub const MAX_SWI_CALLS: usize = 256;

    /// Highest coprocessor ID available for external registration; slot 15
    /// is reserved for the system coprocessor.
    pub const MAX_COPRO_ID: u32 = 14;
}

/// Cache organisation selected for each cache.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKind {
    /// Direct-mapped: one candidate line per index.
    Direct,
    /// Fully associative with uniform-random eviction.
    Associative,
    /// N-way set-associative built from direct-mapped ways with a
    /// per-index round-robin fill counter.
    #[default]
    SetAssociative,
}

/// Cache subsystem configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Organisation used for both caches.
    pub kind: CacheKind,
    /// Instruction cache capacity in bytes.
    pub icache_size: usize,
    /// Data cache capacity in bytes.
    pub dcache_size: usize,
    /// Associativity for the set-associative organisation.
    pub ways: usize,
    /// Use a single unified cache (of `dcache_size`) for both streams.
    pub unified: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            icache_size: defaults::ICACHE_SIZE,
            dcache_size: defaults::DCACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            unified: false,
        }
    }
}

/// External bus timing configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Processor cycles per external bus beat.
    pub speed: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            speed: defaults::BUS_SPEED,
        }
    }
}

/// Driver memory configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory size in bytes; rounded down to a whole number of words.
    pub size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size: defaults::MEMORY_SIZE,
        }
    }
}

/// Root configuration for the simulator.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache subsystem configuration.
    pub cache: CacheConfig,
    /// External bus timing.
    pub bus: BusConfig,
    /// Driver memory.
    pub memory: MemoryConfig,
}
