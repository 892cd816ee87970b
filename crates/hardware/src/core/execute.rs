//! Per-cycle datapath interpreter.
//!
//! Executes exactly one control word: selects the A and B buses, runs the
//! barrel shifter and the ALU, applies the multiply hardware, and commits
//! whatever latches the control word's update mask names. The order of
//! operations mirrors the datapath, not the programmer's model: the mode
//! change happens before bus selection, the flag update before the PSR
//! writes, the address-register input at the very end.

use tracing::trace;

use super::Core;
use super::arch::{C_FLAG, Mode, N_FLAG, R_PC, V_FLAG, Z_FLAG};
use super::pipeline::control::{
    UPDATE_CS, UPDATE_DI, UPDATE_DO, UPDATE_FG, UPDATE_IP, UPDATE_MH, UPDATE_ML, UPDATE_MR,
    UPDATE_MS, UPDATE_PC, UPDATE_RD, UPDATE_SR, UPDATE_SS,
};
use super::pipeline::{AInput, AddrInput, BDrive, BInput, Control, MulStage, RegBank};
use crate::common::bus::Width;
use crate::core::units::{alu, booth, shifter};

impl Core {
    /// Executes the current control word against the datapath.
    pub(crate) fn exec(&mut self, ctrl: &Control) {
        // A mode change wired into the stage happens before anything else
        // reads the register file.
        if let Some(mode) = ctrl.mode {
            trace!(%mode, "mode change");
            self.set_mode(mode);
        }

        // Resolving the low half of a multiply: a Booth carry that survived
        // the loop still owes the accumulator one +M at the weight the loop
        // stopped at, except in the signed full-length case where the last
        // recoded digit already absorbed it.
        if ctrl.mul_stage == MulStage::SaveLo
            && self.mult_carry
            && !(self.mult_round == 4 && ctrl.sign)
        {
            let m = self.regs.get(ctrl.rn);
            let k = 8 * self.mult_round;
            let (s, c) = booth::carry_save_add(self.partial.sum_lo, booth::shl(m, k), self.partial.carry_lo);
            self.partial.sum_lo = s;
            self.partial.carry_lo = c;

            let hi = if ctrl.sign {
                booth::sar(m, 32 - k)
            } else {
                booth::shr(m, 32 - k)
            };
            let (s, c) = booth::carry_save_add(self.partial.sum_hi, hi, self.partial.carry_hi);
            self.partial.sum_hi = s;
            self.partial.carry_hi = c;

            self.partial.carry_hi = (self.partial.carry_hi << 1) | (self.partial.carry_lo >> 31);
            self.partial.carry_lo <<= 1;
            self.mult_carry = false;
        }

        // Put values on the buses.
        let a_bus = self.regs.get(ctrl.rn);

        let sext = |v: u32| {
            if ctrl.sign && !(ctrl.imm_mask >> 1) & v != 0 {
                v | !ctrl.imm_mask
            } else {
                v
            }
        };

        let b_bus = match ctrl.b_drive {
            BDrive::Reg => {
                if ctrl.bank_read == RegBank::Current || self.mode == Mode::User {
                    self.regs.get(ctrl.rm)
                } else {
                    self.regs.get_user_banked(ctrl.rm, self.mode)
                }
            }
            BDrive::Imm => sext(self.ipipe[2] & ctrl.imm_mask),
            BDrive::ImmHalf => {
                // The half-word-transfer immediate is split across bits
                // 11:8 and 3:0.
                sext((self.ipipe[2] & 0x0000_000F) | ((self.ipipe[2] >> 4) & 0x0000_00F0))
            }
            BDrive::Din => sext(self.reg_data_in),
            BDrive::Cpsr => self.regs.cpsr(),
            BDrive::Spsr => self.regs.spsr(self.mode),
        };

        // Barrel-shift the B operand; the carry-out is latched for the
        // flag update below.
        let carry_flag = self.regs.cpsr() & C_FLAG != 0;
        let dist = if ctrl.shift_reg {
            self.reg_shift
        } else {
            ctrl.shift_dist
        };
        let (b_shifted, shift_carry) = shifter::shift(b_bus, ctrl.shift_type, dist, carry_flag);
        self.shift_carry = shift_carry;

        let alu_a = match ctrl.ai {
            AInput::Norm => a_bus,
            AInput::Hack => self.hack[0],
            AInput::Magic => ctrl.a_magic,
            AInput::MultLo => self.partial.sum_lo,
            AInput::MultHi => self.partial.sum_hi,
        };
        let alu_b = match ctrl.bi {
            BInput::Norm => b_shifted,
            BInput::Hack => self.hack[1],
            BInput::Null => 0,
            BInput::MultLo => self.partial.carry_lo,
            BInput::MultHi => self.partial.carry_hi,
        };

        // Do the calculations.
        let outcome = alu::execute(ctrl.opcode, alu_a, alu_b, carry_flag);
        let res_bus = outcome.result;
        let inc_pc = self.reg_addr.wrapping_add(4);

        // Multiply hardware: the seed stage latches the multiplier; a
        // stage tagged UPDATE_MS retires one four-digit Booth round.
        if ctrl.mul_stage == MulStage::One {
            self.mult_carry = false;
            self.reg_mult = b_bus;
        }
        if ctrl.updates & UPDATE_MS != 0 {
            let round = self.mult_round;
            self.mult_round += 1;
            booth::four_stage_booth(
                &mut self.partial,
                a_bus,
                round,
                &mut self.mult_carry,
                &mut self.reg_mult,
                ctrl.sign,
            );
        }

        // Flag update. Logical ops take C from the shifter carry-out and
        // leave V alone; arithmetic ops take both from the adder.
        if ctrl.updates & UPDATE_FG != 0 {
            let carry = outcome.carry.unwrap_or(self.shift_carry);
            let overflow = outcome
                .overflow
                .unwrap_or(self.regs.cpsr() & V_FLAG != 0);

            let mut cpsr = self.regs.cpsr() & 0x0FFF_FFFF;
            if outcome.negative {
                cpsr |= N_FLAG;
            }
            if outcome.zero {
                cpsr |= Z_FLAG;
            }
            if carry {
                cpsr |= C_FLAG;
            }
            if overflow {
                cpsr |= V_FLAG;
            }
            self.regs.set_cpsr(cpsr);
        }

        // Masked CPSR write; a new mode field triggers the bank switch.
        if ctrl.updates & UPDATE_CS != 0 {
            let merged = (self.regs.cpsr() & !ctrl.psr_mask) | (res_bus & ctrl.psr_mask);
            if let Some(new_mode) = Mode::from_bits(merged & 0x1F) {
                if new_mode != self.mode {
                    self.set_mode(new_mode);
                }
            }
            let cpsr = (self.regs.cpsr() & !ctrl.psr_mask) | (res_bus & ctrl.psr_mask);
            self.regs.set_cpsr(cpsr);
        }

        // Masked SPSR write; the writer may be changing the mode a later
        // return will restore.
        if ctrl.updates & UPDATE_SS != 0 && self.mode.has_spsr() {
            let spsr = (self.regs.spsr(self.mode) & !ctrl.psr_mask) | (res_bus & ctrl.psr_mask);
            self.regs.set_spsr(self.mode, spsr);
            if let Some(mode) = Mode::from_bits(spsr & 0x1F) {
                self.prev_mode = mode;
            }
        }

        // Destination write. LDM can instruct the core to load the User
        // bank from a privileged mode, hence the override.
        if ctrl.updates & UPDATE_RD != 0 {
            if ctrl.bank_write == RegBank::Current || self.mode == Mode::User {
                self.regs.set(ctrl.rd, res_bus);
            } else {
                self.regs.set_user_banked(ctrl.rd, self.mode, res_bus);
            }
        }

        if ctrl.updates & UPDATE_PC != 0 {
            self.regs.set(R_PC, inc_pc);
        }

        // Stores replicate sub-word data across the bus lanes.
        if ctrl.updates & UPDATE_DO != 0 {
            self.reg_data_out = match ctrl.width {
                Width::Byte => {
                    let b = b_bus & 0x0000_00FF;
                    b | (b << 8) | (b << 16) | (b << 24)
                }
                Width::Half => {
                    let h = b_bus & 0x0000_FFFF;
                    h | (h << 16)
                }
                Width::Word => b_bus,
            };
        }

        if ctrl.updates & UPDATE_IP != 0 {
            self.ipipe[2] = self.ipipe[1];
            self.ipipe[1] = self.bus_current.din;
        }
        if ctrl.updates & UPDATE_DI != 0 {
            self.reg_data_in = self.bus_current.din;
        }
        if ctrl.updates & UPDATE_SR != 0 {
            // Only the low byte of a register shift distance is taken.
            self.reg_shift = b_bus & 0x0000_00FF;
        }
        if ctrl.updates & UPDATE_MR != 0 {
            self.partial.reset();
        }
        if ctrl.updates & UPDATE_ML != 0 {
            self.partial.sum_lo = b_bus;
        }
        if ctrl.updates & UPDATE_MH != 0 {
            self.partial.sum_hi = a_bus;
        }

        self.hack = [a_bus, b_shifted];

        match ctrl.ari {
            AddrInput::Inc => self.reg_addr = inc_pc,
            AddrInput::Alu => self.reg_addr = res_bus,
            AddrInput::Reg => self.reg_addr = self.regs.get(R_PC),
            AddrInput::Hold => {}
        }
        self.write = ctrl.write;
    }
}
