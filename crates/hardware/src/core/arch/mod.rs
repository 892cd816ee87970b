//! Architectural state: processor modes, status registers, banked registers.
//!
//! This module provides:
//! 1. **Modes:** The seven ARM processor modes and their CPSR encodings.
//! 2. **PSR:** Flag bits, interrupt masks and condition-code evaluation.
//! 3. **Registers:** The working register file with per-mode shadow banks
//!    and the atomic mode-switch operation.

/// Processor mode definitions.
pub mod mode;
/// Program status register bits and condition evaluation.
pub mod psr;
/// Banked register file.
pub mod registers;

pub use mode::Mode;
pub use psr::{C_FLAG, Cond, FIQ_DISABLE, IRQ_DISABLE, N_FLAG, V_FLAG, Z_FLAG, cond_test};
pub use registers::{R_CPSR, R_LR, R_PC, R_SP, RegisterFile};
