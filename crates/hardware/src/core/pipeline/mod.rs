//! Micro-op pipeline machinery.
//!
//! Each instruction executes as an ordered recipe of control words, one per
//! cycle. This module provides:
//! 1. **Control words:** The per-stage datapath wiring record.
//! 2. **Pool:** A bounded arena the decoder checks control words out of and
//!    the cycle loop returns them to; no allocation in the hot loop.
//! 3. **Queues:** The bounded current/next recipe sequences.

/// Control word record and update-mask bits.
pub mod control;
/// Bounded control-word arena.
pub mod pool;
/// Bounded micro-op queues.
pub mod queue;

pub use control::{
    AInput, AddrInput, BDrive, BInput, Control, CpStage, FetchKind, MulStage, RegBank,
};
pub use pool::{ControlPool, Handle};
pub use queue::MicroOpQueue;

/// Longest recipe any instruction can decode to (a 16-register LDM with a
/// PC tail), with headroom; both queues and the pool bound are sized by it.
pub const MAX_INST_LEN: usize = 22;
