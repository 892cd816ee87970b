//! Data-processing and status-register recipes.
//!
//! A plain data-processing instruction is one stage, or two when the shift
//! distance lives in a register and must be latched first. Targeting the
//! PC redirects to the move-to-PC recipe: the ALU result goes into the
//! address register and the instruction pipe refills behind it, with an
//! optional mode restore from the SPSR when the S bit is set.

use super::super::Core;
use super::super::arch::{Cond, Mode, R_LR, R_PC};
use super::super::pipeline::control::{
    UPDATE_CS, UPDATE_FG, UPDATE_IP, UPDATE_PC, UPDATE_RD, UPDATE_SR, UPDATE_SS,
};
use super::super::pipeline::{AddrInput, BDrive, BInput};
use crate::core::units::alu::AluOp;
use crate::core::units::shifter::ShiftType;
use crate::isa::Inst;

impl Core {
    /// Data-processing instruction: one stage, plus a shift-latch prefetch
    /// stage for register-specified shift distances.
    pub(crate) fn decode_dpi(&mut self, i: Inst) {
        // Writing the PC is really a branch.
        if i.rd() == R_PC as u32 {
            self.decode_mov_pc(i);
            return;
        }

        let cond = Cond::from(i.cond());
        let prefetch_shift = !i.dp_is_imm() && i.dp_shift_by_reg();

        let (main_cond, mut main_updates) = if prefetch_shift {
            // Latch the low byte of Rs into the shift register first; the
            // main stage then runs unconditionally.
            self.emit(|c| {
                c.cond = cond;
                c.updates = UPDATE_SR | UPDATE_IP;
                c.rm = i.rs() as usize;
                c.b_drive = BDrive::Reg;
                c.ari = AddrInput::Hold;
            });
            (Cond::Al, UPDATE_PC)
        } else {
            (cond, UPDATE_PC | UPDATE_IP)
        };

        let opcode = AluOp::from(i.dp_opcode());
        if opcode.writes_result() {
            main_updates |= UPDATE_RD;
        }
        if i.dp_set_flags() {
            main_updates |= UPDATE_FG;
        }

        self.emit(|c| {
            c.cond = main_cond;
            c.updates = main_updates;
            c.opcode = opcode;
            c.ari = AddrInput::Inc;
            c.rn = i.rn() as usize;
            c.rd = i.rd() as usize;
            c.bi = BInput::Norm;

            if i.dp_is_imm() {
                c.b_drive = BDrive::Imm;
                c.imm_mask = 0x0000_00FF;
                c.shift_type = ShiftType::Ror;
                c.shift_dist = i.dp_rot() * 2;
            } else {
                c.b_drive = BDrive::Reg;
                c.shift_type = ShiftType::from(i.dp_shift_type());
                c.rm = i.rm() as usize;

                if i.dp_shift_by_reg() {
                    c.shift_reg = true;
                } else {
                    c.shift_dist = i.dp_shift_imm();
                    // ROR #0 encodes RRX.
                    if c.shift_dist == 0 && c.shift_type == ShiftType::Ror {
                        c.shift_type = ShiftType::Rrx;
                    }
                }
            }
        });
    }

    /// Data-processing with the PC as destination: a branch in disguise.
    ///
    /// The ALU stage drives its result straight into the address register
    /// and the next two stages refill the pipe from there. With the S bit
    /// set the final stage also restores the mode recorded in the SPSR.
    fn decode_mov_pc(&mut self, i: Inst) {
        let cond = Cond::from(i.cond());

        let main_cond = if !i.dp_is_imm() && i.dp_shift_by_reg() {
            self.emit(|c| {
                c.cond = cond;
                c.updates = UPDATE_SR;
                c.rm = i.rs() as usize;
                c.b_drive = BDrive::Reg;
                c.ari = AddrInput::Hold;
            });
            Cond::Al
        } else {
            cond
        };

        // Stage 1: the data op itself, result into the address register.
        self.emit(|c| {
            c.cond = main_cond;
            c.opcode = AluOp::from(i.dp_opcode());
            c.updates = UPDATE_IP;
            if i.dp_set_flags() {
                c.updates |= UPDATE_FG;
            }
            c.ari = AddrInput::Alu;
            c.rn = i.rn() as usize;
            c.rd = i.rd() as usize;
            c.bi = BInput::Norm;

            if i.dp_is_imm() {
                c.b_drive = BDrive::Imm;
                c.imm_mask = 0x0000_00FF;
                c.shift_type = ShiftType::Ror;
                c.shift_dist = i.dp_rot() * 2;
            } else {
                c.b_drive = BDrive::Reg;
                c.shift_type = ShiftType::from(i.dp_shift_type());
                c.rm = i.rm() as usize;
                if i.dp_shift_by_reg() {
                    c.shift_reg = true;
                } else {
                    c.shift_dist = i.dp_shift_imm();
                }
            }
        });

        // Stage 2: refill.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_IP;
            c.bi = BInput::Norm;
            c.ari = AddrInput::Inc;
            c.b_drive = BDrive::Reg;
            c.opcode = AluOp::Mov;
            c.rm = R_PC;
            c.rd = R_LR;
        });

        // Stage 3: finish the refill; restore the SPSR mode if requested.
        let mode = if i.dp_set_flags() {
            Mode::from_bits(self.regs.spsr(self.mode) & 0x1F)
        } else {
            None
        };
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_PC | UPDATE_IP;
            c.bi = BInput::Norm;
            c.ari = AddrInput::Inc;
            c.b_drive = BDrive::Reg;
            c.shift_dist = 2;
            c.rn = R_LR;
            c.rd = R_LR;
            c.mode = mode;
        });
    }

    /// MRS: one-stage MOV from the CPSR or SPSR into Rd.
    pub(crate) fn decode_mrs(&mut self, i: Inst) {
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_RD | UPDATE_IP | UPDATE_PC;
            c.ari = AddrInput::Inc;
            c.opcode = AluOp::Mov;
            c.b_drive = if i.psr_spsr() {
                BDrive::Spsr
            } else {
                BDrive::Cpsr
            };
            c.rd = i.rd() as usize;
        });
    }

    /// MSR: one-stage masked write into the CPSR or SPSR.
    pub(crate) fn decode_msr(&mut self, i: Inst) {
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_IP | UPDATE_PC;
            c.updates |= if i.psr_spsr() { UPDATE_SS } else { UPDATE_CS };
            c.ari = AddrInput::Inc;
            c.imm_mask = 0x0000_00FF;
            c.opcode = AluOp::Mov;

            if i.msr_is_imm() {
                // Immediate writes only reach the flag byte.
                c.b_drive = BDrive::Imm;
                c.shift_dist = i.dp_rot();
                c.shift_type = ShiftType::Ror;
                c.psr_mask = 0xFF00_0000;
            } else {
                c.b_drive = BDrive::Reg;
                c.rm = i.rm() as usize;
                c.psr_mask = (0..4)
                    .filter(|&j| i.msr_field() >> j & 0x1 == 0x1)
                    .fold(0, |mask, j| mask | (0xFF << (j * 8)));
            }
        });
    }
}
