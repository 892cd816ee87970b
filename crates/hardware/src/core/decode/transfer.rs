//! Memory transfer recipes.
//!
//! Loads and stores share a shape: an address-generation stage whose ALU
//! result lands in the address register, a data stage that latches data in
//! or drives data out (folding the base writeback into the same ALU pass
//! via the previous cycle's operand latches), and for loads a final stage
//! moving the data-in latch to its register. Loading the PC grows a
//! pipeline-refill tail. Multiple transfers repeat the data stage once per
//! listed register.

use super::super::Core;
use super::super::arch::{Cond, Mode, R_PC};
use super::super::pipeline::control::{
    UPDATE_DI, UPDATE_DO, UPDATE_IP, UPDATE_PC, UPDATE_RD,
};
use super::super::pipeline::{AInput, AddrInput, BDrive, BInput, FetchKind, RegBank};
use super::noop;
use crate::common::bus::Width;
use crate::core::units::alu::AluOp;
use crate::core::units::shifter::ShiftType;
use crate::isa::Inst;

/// The add/sub select every transfer recipe keys off the U bit.
fn updown(i: Inst) -> AluOp {
    if i.xfer_up() { AluOp::Add } else { AluOp::Sub }
}

/// Base writeback applies pre-indexed-with-W and every post-indexed form.
fn writes_back(i: Inst) -> bool {
    (i.xfer_pre() && i.xfer_writeback()) || !i.xfer_pre()
}

impl Core {
    /// Single word/byte transfer dispatch.
    pub(crate) fn decode_swt(&mut self, i: Inst) {
        if i.xfer_load() {
            self.decode_swt_load(i);
        } else {
            self.decode_swt_store(i);
        }
    }

    fn decode_swt_store(&mut self, i: Inst) {
        // Stage 1: generate the transfer address and request the write.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.imm_mask = 0x0000_0FFF;
            c.rn = i.rn() as usize;
            c.opcode = updown(i);
            if i.swt_is_reg_offset() {
                c.b_drive = BDrive::Reg;
                c.shift_type = ShiftType::from(i.dp_shift_type());
                c.shift_dist = i.dp_shift_imm();
                c.rm = i.rm() as usize;
            } else {
                c.b_drive = BDrive::Imm;
            }
            c.write = true;
            c.fetch = FetchKind::Data;
            c.width = if i.swt_byte() { Width::Byte } else { Width::Word };
        });

        // Stage 2: drive the data out; the base writeback reuses last
        // cycle's shifted offset through the operand latches.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DO;
            if writes_back(i) {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = updown(i);
            c.b_drive = BDrive::Reg;
            c.rm = i.rd() as usize;
            c.ari = AddrInput::Reg;
        });
    }

    fn decode_swt_load(&mut self, i: Inst) {
        // Stage 1: generate the transfer address (same as a store).
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.opcode = updown(i);
            c.imm_mask = 0x0000_0FFF;
            c.fetch = FetchKind::Data;
            c.rn = i.rn() as usize;
            c.ai = AInput::Norm;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.width = if i.swt_byte() { Width::Byte } else { Width::Word };
            if i.swt_is_reg_offset() {
                c.b_drive = BDrive::Reg;
                c.shift_type = ShiftType::from(i.dp_shift_type());
                c.shift_dist = i.dp_shift_imm();
                c.rm = i.rm() as usize;
            } else {
                c.b_drive = BDrive::Imm;
            }
        });

        // Stage 2: latch the data coming in; writeback as for a store.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DI;
            if writes_back(i) {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = updown(i);
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Reg;
            c.fetch = FetchKind::Data;
        });

        if i.rd() != R_PC as u32 {
            // Stage 3: move the latched data to its register.
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_RD;
                c.opcode = AluOp::Mov;
                c.bi = BInput::Norm;
                c.b_drive = BDrive::Din;
                c.rd = i.rd() as usize;
                c.ari = AddrInput::Reg;
            });
        } else {
            // Loading the PC: branch to the loaded value and refill.
            self.emit(|c| {
                c.cond = Cond::Al;
                c.b_drive = BDrive::Din;
                c.bi = BInput::Norm;
                c.opcode = AluOp::Mov;
                c.updates = 0;
                c.ari = AddrInput::Alu;
            });
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_IP;
                c.ari = AddrInput::Inc;
            });
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_PC | UPDATE_IP;
                c.ari = AddrInput::Inc;
            });
        }
    }

    /// Half-word / signed transfer dispatch.
    pub(crate) fn decode_hwt(&mut self, i: Inst) {
        if i.xfer_load() {
            self.decode_hwt_load(i);
        } else {
            self.decode_hwt_store(i);
        }
    }

    fn decode_hwt_load(&mut self, i: Inst) {
        // Stage 1: generate the address.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.opcode = updown(i);
            c.imm_mask = 0x0000_00FF;
            c.fetch = FetchKind::Data;
            c.rn = i.rn() as usize;
            c.ai = AInput::Norm;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.width = if i.hwt_half() { Width::Half } else { Width::Byte };
            if i.hwt_is_imm() {
                c.b_drive = BDrive::ImmHalf;
            } else {
                c.b_drive = BDrive::Reg;
                c.rm = i.rm() as usize;
            }
        });

        // Stage 2: latch data in, write the base back if requested.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DI;
            if writes_back(i) {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = updown(i);
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Reg;
            c.fetch = FetchKind::Data;
        });

        // Stage 3: move to the register, sign-extending if requested.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD;
            c.opcode = AluOp::Mov;
            c.bi = BInput::Norm;
            c.b_drive = BDrive::Din;
            c.rd = i.rd() as usize;
            c.ari = AddrInput::Reg;
            c.sign = i.hwt_signed();
            c.imm_mask = if i.hwt_half() { 0x0000_FFFF } else { 0x0000_00FF };
        });
    }

    fn decode_hwt_store(&mut self, i: Inst) {
        // Stage 1: generate the address and request the write.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.imm_mask = 0x0000_00FF;
            c.rn = i.rn() as usize;
            c.opcode = updown(i);
            if i.hwt_is_imm() {
                c.b_drive = BDrive::ImmHalf;
            } else {
                c.b_drive = BDrive::Reg;
                c.rm = i.rm() as usize;
            }
            c.write = true;
            c.fetch = FetchKind::Data;
            c.width = if i.hwt_half() { Width::Half } else { Width::Byte };
        });

        // Stage 2: drive the data out and write the base back.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DO;
            if writes_back(i) {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = updown(i);
            c.b_drive = BDrive::Reg;
            c.rm = i.rd() as usize;
            c.ari = AddrInput::Reg;
        });
    }

    /// Multiple register transfer dispatch.
    ///
    /// An empty register list decodes to a no-op.
    pub(crate) fn decode_mrt(&mut self, i: Inst) {
        if i.mrt_list() == 0 {
            let h = noop(&mut self.pool);
            self.next.push(h);
            return;
        }

        if i.xfer_load() {
            self.decode_mrt_load(i);
        } else {
            self.decode_mrt_store(i);
        }
    }

    /// Initial-address magic constant for LDM/STM.
    ///
    /// The four addressing variants collapse into one signed offset from
    /// the base register: ascending transfers start at the base (or one
    /// word above it, pre-indexed); descending transfers start below the
    /// block.
    fn mrt_start_offset(i: Inst, count: u32) -> u32 {
        if i.xfer_up() {
            if i.xfer_pre() { 4 } else { 0 }
        } else {
            let magnitude = count * 4 + if i.xfer_pre() { 0 } else { 4 };
            magnitude.wrapping_neg()
        }
    }

    /// Base writeback magic constant: the whole block's size, signed.
    fn mrt_writeback_offset(i: Inst, count: u32) -> u32 {
        let magnitude = count * 4;
        if i.xfer_up() {
            magnitude
        } else {
            magnitude.wrapping_neg()
        }
    }

    fn decode_mrt_load(&mut self, i: Inst) {
        let count = i.mrt_list().count_ones();
        // S without the PC in the list targets the User bank; with the PC
        // it instead restores the mode from the SPSR at the end.
        let user_bank = i.mrt_list() & 0x8000 == 0 && i.mrt_s();

        // Stage 0: generate the initial transfer address.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.rm = i.rn() as usize;
            c.ai = AInput::Magic;
            c.opcode = AluOp::Add;
            c.a_magic = Self::mrt_start_offset(i, count);
            c.bi = BInput::Norm;
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Alu;
            c.updates = UPDATE_IP | UPDATE_PC;
            c.fetch = FetchKind::Data;
        });

        // Stage 1: first data word arrives; base writeback if requested.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DI;
            if i.xfer_writeback() {
                c.updates |= UPDATE_RD;
                c.ai = AInput::Magic;
                c.bi = BInput::Hack;
                c.opcode = AluOp::Add;
                c.a_magic = Self::mrt_writeback_offset(i, count);
                c.rd = i.rn() as usize;
            }
            c.b_drive = BDrive::Reg;
            c.fetch = FetchKind::Data;
            c.ari = if count > 1 {
                AddrInput::Inc
            } else {
                AddrInput::Reg
            };
        });

        // Middle stages: retire one register per cycle while the next
        // word streams in.
        let mut list = i.mrt_list();
        let mut reg = 0usize;
        for j in 1..count {
            while list & 1 == 0 {
                list >>= 1;
                reg += 1;
            }
            let rd = reg;
            list &= !1;

            let ari = if j < count - 1 {
                AddrInput::Inc
            } else {
                AddrInput::Reg
            };
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_RD | UPDATE_DI;
                c.opcode = AluOp::Mov;
                c.bi = BInput::Norm;
                c.b_drive = BDrive::Din;
                c.rd = rd;
                c.bank_write = if user_bank { RegBank::User } else { RegBank::Current };
                c.ari = ari;
                c.fetch = FetchKind::Data;
            });
        }

        // Final register: a plain move, or the PC with a refill tail.
        while list & 1 == 0 {
            list >>= 1;
            reg += 1;
        }

        if reg != R_PC {
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_RD;
                c.opcode = AluOp::Mov;
                c.bank_write = if user_bank { RegBank::User } else { RegBank::Current };
                c.bi = BInput::Norm;
                c.b_drive = BDrive::Din;
                c.rd = reg;
                c.ari = AddrInput::Reg;
            });
        } else {
            self.emit(|c| {
                c.cond = Cond::Al;
                c.b_drive = BDrive::Din;
                c.bi = BInput::Norm;
                c.opcode = AluOp::Mov;
                c.updates = 0;
                c.ari = AddrInput::Alu;
            });
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_IP;
                c.ari = AddrInput::Inc;
            });

            let mode = if i.mrt_s() {
                Mode::from_bits(self.regs.spsr(self.mode) & 0x1F)
            } else {
                None
            };
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_PC | UPDATE_IP;
                c.ari = AddrInput::Inc;
                c.mode = mode;
            });
        }
    }

    fn decode_mrt_store(&mut self, i: Inst) {
        let count = i.mrt_list().count_ones();

        // Stage 0: generate the initial transfer address and request the
        // first write.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.rm = i.rn() as usize;
            c.ai = AInput::Magic;
            c.opcode = AluOp::Add;
            c.a_magic = Self::mrt_start_offset(i, count);
            c.bi = BInput::Norm;
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Alu;
            c.updates = UPDATE_IP | UPDATE_PC;
            c.write = true;
            c.fetch = FetchKind::Data;
        });

        // One stage per listed register.
        let mut list = i.mrt_list();
        let mut reg = 0usize;
        for j in 1..=count {
            while list & 1 == 0 {
                list >>= 1;
                reg += 1;
            }
            let rm = reg;
            list &= !1;

            let last = j == count;
            let writeback_here = i.xfer_writeback() && j == 1;
            self.emit(|c| {
                c.cond = Cond::Al;
                c.updates = UPDATE_DO;
                c.b_drive = BDrive::Reg;
                c.rm = rm;
                c.bank_read = if i.mrt_s() { RegBank::User } else { RegBank::Current };

                if last {
                    c.ari = AddrInput::Reg;
                } else {
                    c.ari = AddrInput::Inc;
                    c.write = true;
                    c.fetch = FetchKind::Data;
                }

                if writeback_here {
                    c.updates |= UPDATE_RD;
                    c.ai = AInput::Magic;
                    c.bi = BInput::Hack;
                    c.opcode = AluOp::Add;
                    c.a_magic = Self::mrt_writeback_offset(i, count);
                    c.rd = i.rn() as usize;
                }
            });
        }
    }

    /// Single data swap: an atomic read-then-write of one location.
    ///
    /// Four stages: address the location, latch the old value while
    /// requesting the write, drive the new value out, then move the old
    /// value into Rd.
    pub(crate) fn decode_swap(&mut self, i: Inst) {
        let width = if i.swt_byte() { Width::Byte } else { Width::Word };

        // Stage 1: drive the address from Rn.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.opcode = AluOp::Add;
            c.rn = i.rn() as usize;
            c.bi = BInput::Null;
            c.fetch = FetchKind::Data;
            c.width = width;
        });

        // Stage 2: latch the read data and request the write-back of Rm
        // to the same (held) address.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DI;
            c.ari = AddrInput::Hold;
            c.write = true;
            c.fetch = FetchKind::Data;
            c.width = width;
        });

        // Stage 3: drive Rm onto the bus.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DO;
            c.b_drive = BDrive::Reg;
            c.rm = i.rm() as usize;
            c.ari = AddrInput::Hold;
            c.fetch = FetchKind::Data;
            c.width = width;
        });

        // Stage 4: the old value lands in Rd.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_RD;
            c.opcode = AluOp::Mov;
            c.bi = BInput::Norm;
            c.b_drive = BDrive::Din;
            c.rd = i.rd() as usize;
            c.ari = AddrInput::Reg;
        });
    }
}
