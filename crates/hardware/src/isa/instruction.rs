//! Raw instruction word with named field extractors.
//!
//! ARM instruction formats overlap heavily, so rather than one struct per
//! format this is a single wrapper with accessors grouped by format. Each
//! accessor returns the raw field; interpretation (sign extension, scaling)
//! belongs to the decoder.

/// A raw 32-bit ARM instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inst(pub u32);

impl Inst {
    #[inline]
    fn bit(self, n: u32) -> bool {
        (self.0 >> n) & 1 != 0
    }

    #[inline]
    fn bits(self, hi: u32, lo: u32) -> u32 {
        (self.0 >> lo) & ((1 << (hi - lo + 1)) - 1)
    }

    /// Condition field (bits 31:28).
    pub fn cond(self) -> u32 {
        self.bits(31, 28)
    }

    // --- Data processing ---

    /// ALU opcode (bits 24:21).
    pub fn dp_opcode(self) -> u32 {
        self.bits(24, 21)
    }

    /// S bit: update the condition flags.
    pub fn dp_set_flags(self) -> bool {
        self.bit(20)
    }

    /// Immediate-operand form (bit 25).
    pub fn dp_is_imm(self) -> bool {
        self.bit(25)
    }

    /// Immediate rotation count (bits 11:8); the actual rotation is twice this.
    pub fn dp_rot(self) -> u32 {
        self.bits(11, 8)
    }

    /// Shift type applied to Rm (bits 6:5).
    pub fn dp_shift_type(self) -> u32 {
        self.bits(6, 5)
    }

    /// Immediate shift distance (bits 11:7).
    pub fn dp_shift_imm(self) -> u32 {
        self.bits(11, 7)
    }

    /// Shift-distance-in-register form (bit 4, register-operand encodings).
    pub fn dp_shift_by_reg(self) -> bool {
        self.bit(4)
    }

    /// Shift-distance register Rs (bits 11:8).
    pub fn rs(self) -> u32 {
        self.bits(11, 8)
    }

    /// First operand register Rn (bits 19:16).
    pub fn rn(self) -> u32 {
        self.bits(19, 16)
    }

    /// Destination register Rd (bits 15:12).
    pub fn rd(self) -> u32 {
        self.bits(15, 12)
    }

    /// Second operand register Rm (bits 3:0).
    pub fn rm(self) -> u32 {
        self.bits(3, 0)
    }

    // --- Branch ---

    /// Link bit for branch instructions.
    pub fn branch_link(self) -> bool {
        self.bit(24)
    }

    // --- Transfers (word/byte, half-word, multiple) ---

    /// Pre-indexing bit.
    pub fn xfer_pre(self) -> bool {
        self.bit(24)
    }

    /// Up/down bit; `true` = offset is added.
    pub fn xfer_up(self) -> bool {
        self.bit(23)
    }

    /// Writeback bit.
    pub fn xfer_writeback(self) -> bool {
        self.bit(21)
    }

    /// Load/store bit; `true` = load.
    pub fn xfer_load(self) -> bool {
        self.bit(20)
    }

    /// Byte-width bit for single word transfers and swap.
    pub fn swt_byte(self) -> bool {
        self.bit(22)
    }

    /// Register-offset form for single word transfers (bit 25).
    pub fn swt_is_reg_offset(self) -> bool {
        self.bit(25)
    }

    /// Immediate-offset form for half-word transfers (bit 22).
    pub fn hwt_is_imm(self) -> bool {
        self.bit(22)
    }

    /// Signed-extension bit for half-word transfers.
    pub fn hwt_signed(self) -> bool {
        self.bit(6)
    }

    /// Half-word (vs byte) bit for half-word transfers.
    pub fn hwt_half(self) -> bool {
        self.bit(5)
    }

    /// S bit for multiple transfers (user bank / SPSR restore).
    pub fn mrt_s(self) -> bool {
        self.bit(22)
    }

    /// Register list for multiple transfers (bits 15:0).
    pub fn mrt_list(self) -> u32 {
        self.bits(15, 0)
    }

    // --- Multiply ---

    /// Multiply opcode (bits 23:21): MUL, MLA, UMULL, UMLAL, SMULL, SMLAL.
    pub fn mult_opcode(self) -> u32 {
        self.bits(23, 21)
    }

    /// Multiply destination (RdHi for long forms), bits 19:16.
    pub fn mult_rd(self) -> u32 {
        self.bits(19, 16)
    }

    /// Multiply accumulator (RdLo for long forms), bits 15:12.
    pub fn mult_rn(self) -> u32 {
        self.bits(15, 12)
    }

    // --- Status register transfers ---

    /// `true` = SPSR, `false` = CPSR (bit 22 of MRS/MSR).
    pub fn psr_spsr(self) -> bool {
        self.bit(22)
    }

    /// Immediate form of MSR (bit 25).
    pub fn msr_is_imm(self) -> bool {
        self.bit(25)
    }

    /// MSR field mask (bits 19:16): one bit per PSR byte.
    pub fn msr_field(self) -> u32 {
        self.bits(19, 16)
    }

    // --- Coprocessor ---

    /// Coprocessor number (bits 11:8).
    pub fn cp_num(self) -> u32 {
        self.bits(11, 8)
    }

    /// Coprocessor register Crn (bits 19:16).
    pub fn cp_crn(self) -> u32 {
        self.bits(19, 16)
    }

    /// Coprocessor register Crm (bits 3:0).
    pub fn cp_crm(self) -> u32 {
        self.bits(3, 0)
    }

    /// Coprocessor opcode 2 (bits 7:5).
    pub fn cp_op2(self) -> u32 {
        self.bits(7, 5)
    }
}
