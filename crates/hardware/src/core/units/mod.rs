//! Datapath units: ALU, barrel shifter, multiply hardware and the caches.

/// Data-processing ALU with flag outcomes.
pub mod alu;
/// Radix-4 Booth multiply stages over carry-save adders.
pub mod booth;
/// Line caches (direct, associative, set-associative).
pub mod cache;
/// Barrel shifter.
pub mod shifter;
