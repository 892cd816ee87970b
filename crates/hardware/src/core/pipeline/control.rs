//! Control words.
//!
//! A control word describes one pipeline stage's datapath wiring: which
//! registers drive the A and B buses, how the B operand is shifted, what
//! the ALU does, which latches the stage writes (the update mask), how the
//! address register advances, and the stage's multiply/coprocessor tags.
//! The decoder synthesizes an ordered sequence of these per instruction;
//! the datapath interprets exactly one per cycle.

use crate::core::arch::{Cond, Mode};
use crate::core::units::alu::AluOp;
use crate::core::units::shifter::ShiftType;

/// Update the PC from the incrementer.
pub const UPDATE_PC: u32 = 0x0001;
/// Update the destination register.
pub const UPDATE_RD: u32 = 0x0002;
/// Update the instruction pipe (triggers a decode this cycle).
pub const UPDATE_IP: u32 = 0x0004;
/// Update the data-in latch from the bus.
pub const UPDATE_DI: u32 = 0x0008;
/// Update the data-out latch from the B bus.
pub const UPDATE_DO: u32 = 0x0010;
/// Update the condition flags.
pub const UPDATE_FG: u32 = 0x0020;
/// Update the shift-distance latch from the B bus.
pub const UPDATE_SR: u32 = 0x0040;
/// Update the CPSR from the ALU result under the PSR mask.
pub const UPDATE_CS: u32 = 0x0080;
/// Update the current mode's SPSR from the ALU result under the PSR mask.
pub const UPDATE_SS: u32 = 0x0100;
/// Reset the multiply partial-product registers.
pub const UPDATE_MR: u32 = 0x0200;
/// Run one multiply round (four Booth stages) this cycle.
pub const UPDATE_MS: u32 = 0x0400;
/// Preload the partial sum low half from the B bus.
pub const UPDATE_ML: u32 = 0x0800;
/// Preload the partial sum high half from the A bus.
pub const UPDATE_MH: u32 = 0x1000;

/// Address register input select for the end of the stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddrInput {
    /// Take the incremented address (sequential fetch).
    Inc,
    /// Take the ALU result (branch targets, transfer addresses).
    Alu,
    /// Take the PC register (return to instruction stream).
    Reg,
    /// Hold the current address.
    #[default]
    Hold,
}

/// B bus drive select.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BDrive {
    /// Register Rm (optionally through the User bank override).
    #[default]
    Reg,
    /// Immediate field of the current instruction under `imm_mask`.
    Imm,
    /// Split half-word-transfer immediate (bits 11:8 and 3:0).
    ImmHalf,
    /// The data-in latch.
    Din,
    /// The CPSR.
    Cpsr,
    /// The current mode's SPSR.
    Spsr,
}

/// ALU A input override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AInput {
    /// The A bus (register Rn).
    #[default]
    Norm,
    /// The previous cycle's A bus latch.
    Hack,
    /// The control word's magic constant.
    Magic,
    /// Multiply partial sum, low half.
    MultLo,
    /// Multiply partial sum, high half.
    MultHi,
}

/// ALU B input override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BInput {
    /// The shifted B bus.
    #[default]
    Norm,
    /// The previous cycle's shifted-B latch.
    Hack,
    /// Zero.
    Null,
    /// Multiply partial carry, low half.
    MultLo,
    /// Multiply partial carry, high half.
    MultHi,
}

/// Multiply stage tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MulStage {
    /// Not a multiply stage.
    #[default]
    None,
    /// Seed stage: latch the multiplier, clear the Booth carry.
    One,
    /// Loop stage: re-executes until the multiplier register drains.
    Loop,
    /// Resolve and store the low result half (with residual-carry fix-up).
    SaveLo,
    /// Resolve and store the high result half.
    SaveHi,
}

/// Coprocessor handshake stage tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CpStage {
    /// Not a coprocessor stage.
    #[default]
    None,
    /// Request stage: assert cpi and wait for acknowledge or abort.
    Init,
    /// Wait stage: hold until the coprocessor reports not-busy.
    Wait,
}

/// Register bank selection override for reads/writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegBank {
    /// The live bank of the current mode.
    #[default]
    Current,
    /// The User bank (LDM/STM S-bit access from privileged modes).
    User,
}

/// Whether this stage's bus request fetches an instruction or data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchKind {
    /// Instruction fetch (routed to the I-cache).
    #[default]
    Instruction,
    /// Data access (routed to the D-cache).
    Data,
}

/// Transfer width requested by the stage.
pub use crate::common::bus::Width;

/// One pipeline stage's datapath wiring.
#[derive(Clone, Copy, Debug, Default)]
pub struct Control {
    /// Destination register selector.
    pub rd: usize,
    /// A bus register selector.
    pub rn: usize,
    /// B bus register selector.
    pub rm: usize,
    /// Latch update mask (`UPDATE_*` bits).
    pub updates: u32,
    /// Address register input select.
    pub ari: AddrInput,
    /// B bus drive select.
    pub b_drive: BDrive,
    /// ALU opcode.
    pub opcode: AluOp,
    /// Shift applied to the B bus.
    pub shift_type: ShiftType,
    /// Immediate shift distance.
    pub shift_dist: u32,
    /// Take the shift distance from the shift latch instead.
    pub shift_reg: bool,
    /// Mask applied to the immediate drive.
    pub imm_mask: u32,
    /// Byte mask for CPSR/SPSR writes.
    pub psr_mask: u32,
    /// ALU A input override.
    pub ai: AInput,
    /// ALU B input override.
    pub bi: BInput,
    /// Condition code gating the whole remaining recipe.
    pub cond: Cond,
    /// Drive a bus write at the end of this stage.
    pub write: bool,
    /// Transfer width of the stage's bus request.
    pub width: Width,
    /// Marks a coprocessor-space (not memory) transfer.
    pub enout: bool,
    /// Mode switch to perform before the stage's datapath work.
    pub mode: Option<Mode>,
    /// Fetch kind of the stage's bus request.
    pub fetch: FetchKind,
    /// Invoke the registered SWI callback when this stage executes.
    pub is_swi: bool,
    /// Constant driven onto the ALU A input under [`AInput::Magic`].
    pub a_magic: u32,
    /// Sign-extend the immediate / data-in drive under `imm_mask`.
    pub sign: bool,
    /// Multiply stage tag.
    pub mul_stage: MulStage,
    /// Coprocessor handshake stage tag.
    pub cp_stage: CpStage,
    /// Bank override for B bus register reads.
    pub bank_read: RegBank,
    /// Bank override for destination register writes.
    pub bank_write: RegBank,
}
