//! Coprocessor instruction recipes.
//!
//! Every coprocessor recipe opens with a handshake stage tagged
//! [`CpStage::Init`]: the cycle loop keeps re-asserting the request until
//! some coprocessor acknowledges, and converts the whole instruction into
//! the undefined-instruction trap if none does. Data operations then park
//! in a [`CpStage::Wait`] stage until the coprocessor reports not-busy;
//! transfers run the usual address-generation/data stages with the
//! coprocessor driving or consuming the data bus.

use super::super::Core;
use super::super::arch::Cond;
use super::super::pipeline::control::{UPDATE_DI, UPDATE_DO, UPDATE_IP, UPDATE_PC, UPDATE_RD};
use super::super::pipeline::{AInput, AddrInput, BDrive, BInput, CpStage, FetchKind};
use crate::core::units::alu::AluOp;
use crate::isa::Inst;

impl Core {
    /// Coprocessor register transfer dispatch (MRC/MCR).
    pub(crate) fn decode_crt(&mut self, i: Inst) {
        if i.xfer_load() {
            self.decode_mrc(i);
        } else {
            self.decode_mcr(i);
        }
    }

    /// MRC: coprocessor register to ARM register.
    fn decode_mrc(&mut self, i: Inst) {
        // Stage 1: ask the coprocessor to do its thing.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_IP | UPDATE_PC;
            c.cp_stage = CpStage::Init;
            c.ari = AddrInput::Hold;
            c.enout = true;
        });

        // Stage 2: the coprocessor's data lands in the data-in latch.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DI;
            c.ari = AddrInput::Hold;
        });

        // Stage 3: move it into the target register.
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

    /// MCR: ARM register to coprocessor register.
    fn decode_mcr(&mut self, i: Inst) {
        // Stage 1: handshake.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.cp_stage = CpStage::Init;
            c.ari = AddrInput::Hold;
        });

        // Stage 2: drive the register onto the coprocessor bus.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_DO;
            c.ari = AddrInput::Hold;
            c.rm = i.rd() as usize;
            c.b_drive = BDrive::Reg;
            c.write = true;
            c.enout = true;
        });

        // Stage 3: get ready for the next instruction.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.ari = AddrInput::Reg;
        });
    }

    /// CDP: coprocessor data operation; the core only chaperones.
    pub(crate) fn decode_cdo(&mut self, i: Inst) {
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC | UPDATE_IP;
            c.cp_stage = CpStage::Init;
            c.ari = AddrInput::Inc;
        });

        // This stage holds for as long as the coprocessor stays busy.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.cp_stage = CpStage::Wait;
            c.ari = AddrInput::Hold;
        });
    }

    /// Coprocessor data transfer dispatch (LDC/STC).
    pub(crate) fn decode_cdt(&mut self, i: Inst) {
        if i.xfer_load() {
            self.decode_cdt_load(i);
        } else {
            self.decode_cdt_store(i);
        }
    }

    /// LDC: memory word into a coprocessor register.
    fn decode_cdt_load(&mut self, i: Inst) {
        // Stage 1: see if the coprocessor is awake.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC;
            c.cp_stage = CpStage::Init;
            c.ari = AddrInput::Hold;
        });

        // Stage 2: generate the transfer address. The instruction pipe
        // could not advance until the immediate had been consumed.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.opcode = if i.xfer_up() { AluOp::Add } else { AluOp::Sub };
            c.imm_mask = 0x0000_00FF;
            c.fetch = FetchKind::Data;
            c.rn = i.rn() as usize;
            c.ai = AInput::Norm;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.b_drive = BDrive::Imm;
        });

        // Stage 3: data moves into the coprocessor; handle writeback.
        self.emit(|c| {
            c.cond = Cond::Al;
            if (i.xfer_pre() && i.xfer_writeback()) || !i.xfer_pre() {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = if i.xfer_up() { AluOp::Add } else { AluOp::Sub };
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Inc;
            c.fetch = FetchKind::Data;
        });

        // Stage 4: idle while the coprocessor files the data away.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.ari = AddrInput::Reg;
        });
    }

    /// STC: coprocessor register into memory.
    fn decode_cdt_store(&mut self, i: Inst) {
        // Stage 1: see if the coprocessor is awake.
        self.emit(|c| {
            c.cond = Cond::from(i.cond());
            c.updates = UPDATE_PC;
            c.cp_stage = CpStage::Init;
            c.ari = AddrInput::Hold;
        });

        // Stage 2: generate the address and request the write; the
        // coprocessor supplies the data.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_IP;
            c.ari = AddrInput::Alu;
            c.bi = if i.xfer_pre() { BInput::Norm } else { BInput::Null };
            c.imm_mask = 0x0000_00FF;
            c.rn = i.rn() as usize;
            c.opcode = if i.xfer_up() { AluOp::Add } else { AluOp::Sub };
            c.b_drive = BDrive::Imm;
            c.write = true;
            c.fetch = FetchKind::Data;
        });

        // Stage 3: writeback while the coprocessor drives its data out.
        self.emit(|c| {
            c.cond = Cond::Al;
            if (i.xfer_pre() && i.xfer_writeback()) || !i.xfer_pre() {
                c.updates |= UPDATE_RD;
            }
            c.rn = i.rn() as usize;
            c.bi = BInput::Hack;
            c.rd = i.rn() as usize;
            c.opcode = if i.xfer_up() { AluOp::Add } else { AluOp::Sub };
            c.ari = AddrInput::Reg;
        });
    }
}
