//! Simulation statistics collection and reporting.
//!
//! Tracks the counters the wrapper accumulates while sequencing the bus:
//! 1. **Cycles:** Real (bus) cycles including wait states, and core cycles.
//! 2. **Cache:** Hit/miss counts and completed line fills.
//! 3. **Bus:** Write-through transactions issued to the driver.

use std::fmt;

/// Counters accumulated by the processor wrapper.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimStats {
    /// Real cycles elapsed, including bus acquisition and wait states.
    pub real_cycles: u64,
    /// Cycles the core itself was clocked.
    pub core_cycles: u64,
    /// Cache lookups that hit.
    pub cache_hits: u64,
    /// Cache lookups that missed and triggered a line fill.
    pub cache_misses: u64,
    /// Line fills completed.
    pub line_fills: u64,
    /// Write transactions issued on the external bus.
    pub bus_writes: u64,
}

impl SimStats {
    /// Hit rate over all cache lookups, or `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.cache_hits + self.cache_misses;
        (total != 0).then(|| self.cache_hits as f64 / total as f64)
    }
}

impl fmt::Display for SimStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "cycles: real = {} core = {}",
            self.real_cycles, self.core_cycles
        )?;
        write!(
            f,
            "cache: hits = {} misses = {} fills = {} writes = {}",
            self.cache_hits, self.cache_misses, self.line_fills, self.bus_writes
        )?;
        if let Some(rate) = self.hit_rate() {
            write!(f, " (hit rate {:.1}%)", rate * 100.0)?;
        }
        Ok(())
    }
}
