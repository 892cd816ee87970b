//! Common types shared between the core, the SoC wrapper and the driver.
//!
//! This module provides:
//! 1. **Bus records:** Per-cycle signal snapshots exchanged between components.
//! 2. **Signals and errors:** The cache-miss outcome and the public error enums.

/// Bus signal records (core, coprocessor, external pin-out).
pub mod bus;
/// Cache-miss signal, registration errors and bus faults.
pub mod error;

pub use bus::{CoproBus, CoreBus, Pinout, Width};
pub use error::{BusFault, CacheMiss, RegistrationError};
