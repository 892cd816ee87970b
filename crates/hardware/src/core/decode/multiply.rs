//! Multiply recipes.
//!
//! All six multiplies funnel through the same Booth hardware: a seed stage
//! latches the multiplier register and runs the first four-digit round, a
//! loop stage re-executes until the multiplier drains, and one or two save
//! stages resolve the carry-save accumulator through the ALU into the
//! destination registers. Accumulating forms preload the partial-sum
//! registers from the accumulate operands; long forms save the low half
//! with an ADD that sets the carry the high half's ADC consumes.

use super::super::Core;
use super::super::arch::{Cond, Mode};
use super::super::pipeline::control::{
    UPDATE_FG, UPDATE_IP, UPDATE_MH, UPDATE_ML, UPDATE_MR, UPDATE_MS, UPDATE_PC, UPDATE_RD,
};
use super::super::pipeline::{AInput, AddrInput, BDrive, BInput, MulStage};
use super::{VEC_UNDEF, vector};
use crate::core::units::alu::AluOp;
use crate::isa::Inst;

impl Core {
    /// Dispatches on the 3-bit multiply opcode.
    pub(crate) fn decode_multiply(&mut self, i: Inst) {
        match i.mult_opcode() {
            0 => self.decode_mul(i),
            1 => self.decode_mla(i),
            4 => self.decode_mull(i, false),
            5 => self.decode_mlal(i, false),
            6 => self.decode_mull(i, true),
            7 => self.decode_mlal(i, true),
            _ => vector(&mut self.pool, &mut self.next, Mode::Undef, VEC_UNDEF),
        }
    }

    /// Seed stage: latch Rs as the multiplier and run the first round.
    /// The partial-product registers are zero here by invariant (every
    /// save stage clears them on the way out).
    fn emit_mult_seed(&mut self, i: Inst, first: bool, signed: bool) {
        let cond = Cond::from(i.cond());
        self.emit(|c| {
            c.cond = if first { cond } else { Cond::Al };
            c.updates = UPDATE_MS | if first { UPDATE_IP | UPDATE_PC } else { 0 };
            c.opcode = AluOp::Mov;
            c.ari = if first { AddrInput::Inc } else { AddrInput::Hold };
            c.mul_stage = MulStage::One;
            c.rm = i.rs() as usize;
            c.rn = i.rm() as usize;
            c.b_drive = BDrive::Reg;
            c.sign = signed;
        });
    }

    /// Loop stage: one four-digit round per cycle until the multiplier
    /// register drains.
    fn emit_mult_loop(&mut self, i: Inst, signed: bool) {
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_MS;
            c.ari = AddrInput::Hold;
            c.mul_stage = MulStage::Loop;
            c.rn = i.rm() as usize;
            c.sign = signed;
        });
    }

    /// MUL: seed, loop, save-low.
    fn decode_mul(&mut self, i: Inst) {
        self.emit_mult_seed(i, true, false);
        self.emit_mult_loop(i, false);

        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD | UPDATE_MR;
            c.ari = AddrInput::Hold;
            c.mul_stage = MulStage::SaveLo;
            c.opcode = AluOp::Add;
            c.rd = i.mult_rd() as usize;
            c.rn = i.rm() as usize;
            c.ai = AInput::MultLo;
            c.bi = BInput::MultLo;
        });
    }

    /// MLA: preload the accumulator, then as MUL.
    fn decode_mla(&mut self, i: Inst) {
        let cond = Cond::from(i.cond());

        // Stage 0: Rn into the low partial sum.
        self.emit(|c| {
            c.cond = cond;
            c.updates = UPDATE_IP | UPDATE_PC | UPDATE_ML;
            c.ari = AddrInput::Inc;
            c.rm = i.mult_rn() as usize;
            c.b_drive = BDrive::Reg;
        });

        self.emit_mult_seed(i, false, false);
        self.emit_mult_loop(i, false);

        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD | UPDATE_MR;
            c.ari = AddrInput::Hold;
            c.mul_stage = MulStage::SaveLo;
            c.opcode = AluOp::Add;
            c.rd = i.mult_rd() as usize;
            c.rn = i.rm() as usize;
            c.ai = AInput::MultLo;
            c.bi = BInput::MultLo;
        });
    }

    /// UMULL/SMULL: seed, loop, save-low (sets C for the ADC), save-high.
    fn decode_mull(&mut self, i: Inst, signed: bool) {
        self.emit_mult_seed(i, true, signed);
        self.emit_mult_loop(i, signed);
        self.emit_mull_save(i, signed);
    }

    /// UMLAL/SMLAL: preload RdHi:RdLo into the accumulator, then as MULL.
    fn decode_mlal(&mut self, i: Inst, signed: bool) {
        let cond = Cond::from(i.cond());

        // Stage 0: RdLo into the low partial sum, RdHi into the high.
        self.emit(|c| {
            c.cond = cond;
            c.updates = UPDATE_IP | UPDATE_PC | UPDATE_ML | UPDATE_MH;
            c.ari = AddrInput::Inc;
            c.rm = i.mult_rn() as usize;
            c.rn = i.mult_rd() as usize;
            c.b_drive = BDrive::Reg;
        });

        self.emit_mult_seed(i, false, signed);
        self.emit_mult_loop(i, signed);
        self.emit_mull_save(i, signed);
    }

    /// The two save stages of a long multiply.
    fn emit_mull_save(&mut self, i: Inst, signed: bool) {
        // Low half: partial sum + partial carry, flags set so the carry
        // out of this add reaches the high half.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD | UPDATE_FG;
            c.ari = AddrInput::Hold;
            c.mul_stage = MulStage::SaveLo;
            c.opcode = AluOp::Add;
            c.rd = i.mult_rn() as usize;
            c.rn = i.rm() as usize;
            c.ai = AInput::MultLo;
            c.bi = BInput::MultLo;
            c.sign = signed;
        });

        // High half, with carry.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD | UPDATE_MR;
            c.ari = AddrInput::Hold;
            c.mul_stage = MulStage::SaveHi;
            c.opcode = AluOp::Adc;
            c.rd = i.mult_rd() as usize;
            c.rn = i.rm() as usize;
            c.ai = AInput::MultHi;
            c.bi = BInput::MultHi;
        });
    }
}
