//! Miss signals and error definitions.
//!
//! This module separates two things the original hardware model conflated:
//! 1. **Cache misses**: routine, expected outcomes that drive the line-fill
//!    state machine. [`CacheMiss`] is a plain signal carried in a `Result`,
//!    never an unwinding error, and never escapes the bus sequencer.
//! 2. **Real errors**: configuration-time registration failures and driver
//!    bus faults, reported through standard error types.

use thiserror::Error;

/// A cache lookup failed to find the requested line.
///
/// Carries the word address that missed so the bus sequencer can aim the
/// line fill. Recoverable by design: the wrapper converts every miss into
/// a `ReadLineSetup` transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheMiss {
    /// The word address (byte address >> 2) that missed.
    pub addr: u32,
}

impl CacheMiss {
    /// Creates a miss signal for the given word address.
    #[inline]
    pub const fn new(addr: u32) -> Self {
        Self { addr }
    }
}

/// Registration failures for the SWI callback table and coprocessor slots.
///
/// These are configuration-time errors: they propagate to the caller of the
/// registration API and are not retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The SWI number is out of table range or missing the user-call bit
    /// (bit 23 of the instruction immediate).
    #[error("invalid SWI number {0:#08x}")]
    InvalidSwiNumber(u32),
    /// A handler is already installed for this SWI number.
    #[error("SWI {0:#08x} is already registered")]
    SwiAlreadyRegistered(u32),
    /// The coprocessor ID is outside the registrable range.
    #[error("invalid coprocessor id {0}")]
    InvalidCoproId(u32),
    /// The coprocessor slot is already occupied.
    #[error("coprocessor slot {0} is already occupied")]
    CoproSlotOccupied(u32),
}

/// The driver was asked to service an address outside its memory.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("bus fault: address {addr:#010x} is outside driver memory")]
pub struct BusFault {
    /// The faulting byte address.
    pub addr: u32,
}
