//! Micro-op recipe generation.
//!
//! The decoder runs once per instruction-fetch event (a stage with the
//! instruction-pipe update bit) and turns the word in the decode slot into
//! an ordered recipe of control words in the next queue. Submodules hold
//! the per-class recipes:
//!
//! - [`dpi`]: data processing, move-to-PC, MRS/MSR.
//! - [`transfer`]: single, half-word and multiple transfers, swap.
//! - [`multiply`]: the six multiply recipes.
//! - [`copro`]: coprocessor register/data transfers and data ops.
//!
//! Decode never fails: the all-zero word becomes a no-op, and anything
//! unrecognised becomes the undefined-instruction vector recipe.

/// Coprocessor instruction recipes.
pub mod copro;
/// Data-processing and status-register recipes.
pub mod dpi;
/// Multiply recipes.
pub mod multiply;
/// Memory transfer recipes.
pub mod transfer;

use tracing::trace;

use super::Core;
use super::arch::{Cond, Mode, R_LR, R_PC};
use super::pipeline::control::{UPDATE_IP, UPDATE_PC, UPDATE_RD};
use super::pipeline::{AInput, AddrInput, BDrive, BInput, Control, ControlPool, Handle, MicroOpQueue};
use crate::core::units::alu::AluOp;
use crate::isa::{Inst, InstClass, classify};

/// Reset vector address.
pub const VEC_RESET: u32 = 0x0000_0000;
/// Undefined-instruction vector address.
pub const VEC_UNDEF: u32 = 0x0000_0004;
/// Software-interrupt vector address.
pub const VEC_SWI: u32 = 0x0000_0008;
/// Prefetch-abort vector address.
pub const VEC_PABORT: u32 = 0x0000_000C;
/// Data-abort vector address.
pub const VEC_DABORT: u32 = 0x0000_0010;
/// IRQ vector address.
pub const VEC_IRQ: u32 = 0x0000_0018;
/// FIQ vector address.
pub const VEC_FIQ: u32 = 0x0000_001C;

/// Builds a pipeline no-op.
///
/// A flushed or annulled stage still has to keep the fetch stream moving,
/// so the no-op updates the PC and the instruction pipe and nothing else.
pub(crate) fn noop(pool: &mut ControlPool) -> Handle {
    let h = pool.alloc();
    let c = pool.get_mut(h);
    c.cond = Cond::Al;
    c.opcode = AluOp::Add;
    c.updates = UPDATE_PC | UPDATE_IP;
    c.ari = AddrInput::Inc;
    h
}

/// Appends an exception-vector recipe to a queue.
///
/// Three stages, shared by every trap: drive the vector address into the
/// address register (switching mode), link the old PC, then bias the link
/// register back by 4 while the pipeline refills from the vector.
///
/// # Arguments
///
/// * `pool`  - The control pool.
/// * `queue` - The queue to fill (current for interrupts and aborts,
///   next for decoded traps).
/// * `mode`  - The mode the exception executes in.
/// * `addr`  - The vector address.
pub(crate) fn vector(pool: &mut ControlPool, queue: &mut MicroOpQueue, mode: Mode, addr: u32) {
    let h = pool.alloc();
    let c = pool.get_mut(h);
    c.cond = Cond::Al;
    c.updates = UPDATE_IP;
    c.ai = AInput::Magic;
    c.a_magic = addr;
    c.bi = BInput::Null;
    c.ari = AddrInput::Alu;
    c.opcode = AluOp::Add;
    c.mode = Some(mode);
    queue.push(h);

    let h = pool.alloc();
    let c = pool.get_mut(h);
    c.cond = Cond::Al;
    c.updates = UPDATE_IP | UPDATE_RD;
    c.bi = BInput::Norm;
    c.ari = AddrInput::Inc;
    c.b_drive = BDrive::Reg;
    c.opcode = AluOp::Mov;
    c.rm = R_PC;
    c.rd = R_LR;
    queue.push(h);

    let h = pool.alloc();
    let c = pool.get_mut(h);
    c.cond = Cond::Al;
    c.updates = UPDATE_PC | UPDATE_IP | UPDATE_RD;
    c.ai = AInput::Magic;
    c.a_magic = 4;
    c.rm = R_LR;
    c.rd = R_LR;
    c.b_drive = BDrive::Reg;
    c.ari = AddrInput::Inc;
    c.bi = BInput::Norm;
    c.opcode = AluOp::Rsb;
    queue.push(h);
}

impl Core {
    /// Checks out a control word, wires it up, and appends it to the next
    /// queue. The word starts zeroed, matching the idle datapath.
    pub(crate) fn emit(&mut self, wire: impl FnOnce(&mut Control)) {
        let h = self.pool.alloc();
        wire(self.pool.get_mut(h));
        self.next.push(h);
    }

    /// Decodes the instruction in the decode slot of the pipe into the
    /// next queue.
    pub(crate) fn decode(&mut self) {
        let inst = Inst(self.ipipe[1]);
        trace!(word = format_args!("{:#010x}", inst.0), "decode");

        // The all-zero word pads memory images; treat it as a no-op
        // rather than ANDEQ r0, r0, r0.
        if inst.0 == 0 {
            let h = noop(&mut self.pool);
            self.next.push(h);
            return;
        }

        match classify(inst) {
            InstClass::Branch => self.decode_branch(inst),
            InstClass::SoftwareInterrupt => self.decode_swi(inst),
            InstClass::Multiply => self.decode_multiply(inst),
            InstClass::DataProcessing => self.decode_dpi(inst),
            InstClass::SingleTransfer => self.decode_swt(inst),
            InstClass::HalfTransfer => self.decode_hwt(inst),
            InstClass::MultipleTransfer => self.decode_mrt(inst),
            InstClass::Swap => self.decode_swap(inst),
            InstClass::Mrs => self.decode_mrs(inst),
            InstClass::Msr => self.decode_msr(inst),
            InstClass::CoproDataOp => self.decode_cdo(inst),
            InstClass::CoproDataTransfer => self.decode_cdt(inst),
            InstClass::CoproRegTransfer => self.decode_crt(inst),
            InstClass::Undefined => {
                vector(&mut self.pool, &mut self.next, Mode::Undef, VEC_UNDEF);
            }
        }
    }

    /// Branch / branch-with-link: three stages.
    fn decode_branch(&mut self, i: Inst) {
        let cond = Cond::from(i.cond());
        let link = i.branch_link();

        // Stage 1: target = PC + (sign-extended imm24 << 2).
        self.emit(|c| {
            c.cond = cond;
            c.updates = UPDATE_IP;
            c.bi = BInput::Norm;
            c.ari = AddrInput::Alu;
            c.b_drive = BDrive::Imm;
            c.opcode = AluOp::Add;
            c.shift_dist = 2;
            c.imm_mask = 0x00FF_FFFF;
            c.sign = true;
            c.rn = R_PC;
        });

        // Stage 2: write back the link register if linking.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_IP;
            if link {
                c.updates |= UPDATE_RD;
            }
            c.bi = BInput::Norm;
            c.ari = AddrInput::Inc;
            c.b_drive = BDrive::Reg;
            c.opcode = AluOp::Mov;
            c.rm = R_PC;
            c.rd = R_LR;
        });

        // Stage 3: the stored PC ran ahead of the branch; pull LR back 4.
        self.emit(|c| {
            c.cond = Cond::Al;
            c.updates = UPDATE_PC | UPDATE_IP;
            if link {
                c.updates |= UPDATE_RD;
            }
            c.ai = AInput::Magic;
            c.a_magic = 4;
            c.rm = R_LR;
            c.rd = R_LR;
            c.b_drive = BDrive::Reg;
            c.ari = AddrInput::Inc;
            c.bi = BInput::Norm;
            c.opcode = AluOp::Rsb;
        });
    }

    /// Software interrupt.
    ///
    /// Bit 23 of the immediate marks the emulator's host-call space: a
    /// registered number becomes a single no-op stage flagged to run the
    /// callback; an invalid or unregistered number traps as undefined.
    /// Anything else takes the real SWI vector into SVC mode.
    fn decode_swi(&mut self, i: Inst) {
        if i.0 & 0x0F80_0000 == 0x0F80_0000 {
            let index = (i.0 & 0x007F_FFFF) as usize;
            let registered = self
                .swi_calls
                .get(index)
                .is_some_and(Option::is_some);

            if registered {
                let h = noop(&mut self.pool);
                self.pool.get_mut(h).is_swi = true;
                self.next.push(h);
            } else {
                vector(&mut self.pool, &mut self.next, Mode::Undef, VEC_UNDEF);
            }
        } else {
            vector(&mut self.pool, &mut self.next, Mode::Svc, VEC_SWI);
        }
    }
}
