//! ARM7 system simulator library.
//!
//! This crate implements a cycle-accurate ARM7-family simulator with the following:
//! 1. **Core:** Micro-op pipeline (decode, execute, bus update), banked registers, PSR state.
//! 2. **Caches:** Direct-mapped, fully associative and set-associative line caches.
//! 3. **Multiply:** Radix-4 Booth carry-save reduction matching hardware latency.
//! 4. **SoC:** Bus sequencer, line-fill state machine, on-chip peripherals, coprocessors.
//! 5. **Simulation:** Driver memory, binary/S-record loaders, configuration, statistics.

/// Common types (bus signal records, error and miss signals).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core (arch state, micro-op pipeline, decode, execute, multiply, caches).
pub mod core;
/// Instruction word fields and priority-ordered classification.
pub mod isa;
/// Driver memory, image loaders and the top-level drive loop.
pub mod sim;
/// Processor wrapper (bus sequencer, peripherals, coprocessors).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Processor core; owns registers, micro-op queues and the control pool.
pub use crate::core::Core;
/// Top-level simulator (processor + driver memory); construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Processor wrapper; owns the core, caches, peripherals and coprocessor slots.
pub use crate::soc::ArmProcessor;
