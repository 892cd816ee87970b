//! Processor core.
//!
//! The core is a micro-coded datapath: every instruction executes as an
//! ordered recipe of control words, one per cycle. This module provides:
//! 1. **Cycle engine:** [`Core::cycle`]: interrupt latching, coprocessor
//!    handshake resolution, queue sequencing, condition gating, SWI
//!    dispatch, decode triggering and the advance/hold logic.
//! 2. **State:** Banked registers, instruction pipe, bus latches, multiply
//!    registers, the control pool and both micro-op queues.
//! 3. **SWI table:** The host-callback table keyed by the 23-bit SWI
//!    immediate.

/// Architectural state (modes, PSR, banked registers).
pub mod arch;
/// Micro-op recipe generation.
pub mod decode;
/// Per-cycle datapath interpreter.
pub mod execute;
/// Micro-op pipeline machinery (control words, pool, queues).
pub mod pipeline;
/// Datapath units (ALU, shifter, Booth multiplier, caches).
pub mod units;

use std::fmt;

use tracing::trace;

use crate::common::bus::CoreBus;
use crate::common::error::RegistrationError;
use crate::config::defaults::MAX_SWI_CALLS;
use arch::{FIQ_DISABLE, IRQ_DISABLE, Mode, R_PC, RegisterFile, cond_test};
use decode::{VEC_FIQ, VEC_IRQ, VEC_UNDEF};
use pipeline::{Control, ControlPool, CpStage, FetchKind, MAX_INST_LEN, MicroOpQueue, MulStage};
use pipeline::control::UPDATE_IP;
use units::booth::PartialProduct;

/// Host callback invoked synchronously for a registered SWI.
///
/// Receives R0-R3; the return value is written back to R0.
pub type SwiHandler = Box<dyn FnMut(u32, u32, u32, u32) -> u32 + Send>;

/// The ARM7 processor core.
///
/// Owns the full architectural and micro-architectural state. Driven one
/// cycle at a time through [`Core::cycle`] by the SoC wrapper, which
/// services the bus request the core leaves on the [`CoreBus`].
pub struct Core {
    cycles: u64,
    mode: Mode,
    prev_mode: Mode,
    regs: RegisterFile,

    reg_addr: u32,
    reg_data_in: u32,
    reg_data_out: u32,
    ipipe: [u32; 3],
    reg_shift: u32,
    shift_carry: bool,

    reg_mult: u32,
    mult_carry: bool,
    mult_round: u32,
    partial: PartialProduct,

    pool: ControlPool,
    cur: MicroOpQueue,
    next: MicroOpQueue,
    cursor: usize,
    hack: [u32; 2],

    bus_current: CoreBus,
    bus_previous: CoreBus,
    pending_fiq: bool,
    pending_irq: bool,
    write: bool,

    swi_calls: Vec<Option<SwiHandler>>,
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Core {
    /// Creates a core in the post-reset state (SVC mode, PC at the reset
    /// vector, a no-op seeded in both micro-op queues).
    pub fn new() -> Self {
        let mut core = Self {
            cycles: 0,
            mode: Mode::Svc,
            prev_mode: Mode::User,
            regs: RegisterFile::new(),
            reg_addr: 0,
            reg_data_in: 0,
            reg_data_out: 0,
            ipipe: [0; 3],
            reg_shift: 0,
            shift_carry: false,
            reg_mult: 0,
            mult_carry: false,
            mult_round: 0,
            partial: PartialProduct::default(),
            pool: ControlPool::new(MAX_INST_LEN * 2),
            cur: MicroOpQueue::new(),
            next: MicroOpQueue::new(),
            cursor: 0,
            hack: [0; 2],
            bus_current: CoreBus::default(),
            bus_previous: CoreBus::default(),
            pending_fiq: false,
            pending_irq: false,
            write: false,
            swi_calls: (0..MAX_SWI_CALLS).map(|_| None).collect(),
        };
        core.reset();
        core
    }

    /// Resets the core as if the reset pin had been pulled.
    ///
    /// Safe at any cycle boundary: flushes both micro-op queues back to the
    /// pool, re-seeds them with a no-op, clears the pending-interrupt
    /// latches, zeroes every PSR bank and the multiply registers, and
    /// re-enters SVC mode.
    pub fn reset(&mut self) {
        self.mode = Mode::Svc;
        self.prev_mode = Mode::User;
        self.reg_addr = 0;
        self.write = false;
        self.pending_fiq = false;
        self.pending_irq = false;
        self.shift_carry = false;

        self.cur.flush_all(&mut self.pool);
        let h = decode::noop(&mut self.pool);
        self.cur.push(h);

        self.next.flush_all(&mut self.pool);
        let h = decode::noop(&mut self.pool);
        self.next.push(h);

        self.regs.reset_psrs();

        self.reg_mult = 0;
        self.mult_carry = false;
        self.mult_round = 0;
        self.partial.reset();

        self.set_mode(Mode::Svc);

        self.cursor = 0;
    }

    /// Executes one core cycle.
    ///
    /// The bus carries last cycle's reply (data in, interrupt levels,
    /// coprocessor handshake) on entry and this cycle's request (address,
    /// data out, control) on exit.
    ///
    /// # Arguments
    ///
    /// * `bus` - The shared core bus.
    pub fn cycle(&mut self, bus: &mut CoreBus) {
        // Rotate the bus snapshots for edge detection.
        self.bus_previous = self.bus_current;
        self.bus_current = *bus;

        // Latch interrupts on a falling edge while unmasked; FIQ wins.
        let cpsr = self.regs.cpsr();
        if self.bus_previous.fiq && !self.bus_current.fiq && cpsr & FIQ_DISABLE == 0 {
            trace!("FIQ pending");
            self.pending_fiq = true;
        } else if self.bus_previous.irq && !self.bus_current.irq && cpsr & IRQ_DISABLE == 0 {
            trace!("IRQ pending");
            self.pending_irq = true;
        }

        // Resolve a coprocessor request we had outstanding. This must be
        // done first: an answered one-cycle operation terminates here.
        if self.bus_current.cpi {
            if let Some(h) = self.cur.get(self.cursor) {
                if self.pool.get(h).cp_stage == CpStage::Init {
                    if self.bus_current.cpa {
                        // Nobody claimed the instruction: undefined trap.
                        trace!("coprocessor absent, trapping");
                        self.cur.flush_from(&mut self.pool, self.cursor);
                        decode::vector(&mut self.pool, &mut self.cur, Mode::Undef, VEC_UNDEF);
                        self.cursor = 0;
                    } else if let Some(h) = self.cur.take(self.cursor) {
                        self.pool.free(h);
                        self.cursor += 1;
                    }
                }
            }
        }

        // Did a busy-wait coprocessor operation complete in the meantime?
        if let Some(h) = self.cur.get(self.cursor) {
            if self.pool.get(h).cp_stage == CpStage::Wait && self.bus_current.cpb {
                if let Some(h) = self.cur.take(self.cursor) {
                    self.pool.free(h);
                }
                self.cursor += 1;
            }
        }

        // Recipe exhausted: move to the next instruction, unless an
        // interrupt is pending, in which case synthesize its vector recipe.
        if self.cur.get(self.cursor).is_none() {
            if self.pending_fiq {
                trace!("handling FIQ");
                decode::vector(&mut self.pool, &mut self.cur, Mode::Fiq, VEC_FIQ);
                self.cursor = 0;
                self.pending_fiq = false;
            } else if self.pending_irq {
                trace!("handling IRQ");
                decode::vector(&mut self.pool, &mut self.cur, Mode::Irq, VEC_IRQ);
                self.cursor = 0;
                self.pending_irq = false;
            } else {
                std::mem::swap(&mut self.cur, &mut self.next);
                self.cursor = 0;
                self.mult_round = 0;
            }
        }

        // Gate on the condition code: a failed condition flushes the
        // remainder of the recipe and substitutes a no-op, preserving the
        // PC/instruction-pipe update semantics.
        if let Some(h) = self.cur.get(self.cursor) {
            let cond = self.pool.get(h).cond;
            if !cond_test(cond, self.regs.cpsr()) {
                self.cur.flush_from(&mut self.pool, self.cursor);
                let noop = decode::noop(&mut self.pool);
                self.cur.push(noop);
                self.cursor = 0;
            }
        }

        let Some(handle) = self.cur.get(self.cursor) else {
            unreachable!("micro-op queue empty after refill")
        };
        let ctrl: Control = *self.pool.get(handle);

        // A host SWI executes as a no-op in the stream, plus the callback.
        if ctrl.is_swi {
            let index = (self.ipipe[2] & 0x007F_FFFF) as usize;
            if let Some(Some(handler)) = self.swi_calls.get_mut(index) {
                let r0 = handler(
                    self.regs.get(0),
                    self.regs.get(1),
                    self.regs.get(2),
                    self.regs.get(3),
                );
                self.regs.set(0, r0);
            }
            bus.swi_flush = true;
        }

        // An instruction-pipe update means a new word reached the decode
        // stage: regenerate the next-instruction recipe.
        if ctrl.updates & UPDATE_IP != 0 {
            self.next.flush_all(&mut self.pool);
            self.decode();
        }

        // Exercise the datapath.
        self.exec(&ctrl);

        // Drive the output bus.
        bus.rw = self.write;
        bus.a = self.reg_addr;
        bus.dout = self.reg_data_out;
        bus.bw = ctrl.width;
        bus.opc = ctrl.updates & UPDATE_IP != 0;
        bus.cpi = false;
        bus.enout = ctrl.enout;
        bus.di = ctrl.fetch == FetchKind::Instruction;

        // Advance along the recipe, unless a special case holds position:
        // an unanswered coprocessor request, a busy coprocessor, or a
        // multiply loop that has not drained yet.
        if ctrl.cp_stage == CpStage::Init {
            bus.cpi = true;
            bus.cpa = true;
        } else if !self.bus_current.cpb {
            // Coprocessor busy; retry this stage next cycle.
        } else if ctrl.mul_stage == MulStage::One {
            if let Some(h) = self.cur.take(self.cursor) {
                self.pool.free(h);
            }
            self.cursor += 1;

            // A multiplier of zero never enters the loop stage.
            if self.reg_mult == 0 {
                if let Some(h) = self.cur.take(self.cursor) {
                    self.pool.free(h);
                }
                self.cursor += 1;
            }
        } else if ctrl.mul_stage == MulStage::Loop {
            if self.reg_mult == 0 {
                if let Some(h) = self.cur.take(self.cursor) {
                    self.pool.free(h);
                }
                self.cursor += 1;
            }
        } else {
            if let Some(h) = self.cur.take(self.cursor) {
                self.pool.free(h);
            }
            self.cursor += 1;
        }

        self.cycles += 1;
    }

    /// Switches processor mode, swapping the live register bank.
    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.prev_mode = self.mode;
        self.regs.switch_mode(self.mode, mode);
        self.mode = mode;
    }

    /// Registers a host SWI callback.
    ///
    /// # Arguments
    ///
    /// * `number`  - The 24-bit SWI immediate; bit 23 must be set (it marks
    ///   the host-call space) and the low bits must fall inside the table.
    /// * `handler` - The callback.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidSwiNumber`] for numbers outside the
    /// host-call space, [`RegistrationError::SwiAlreadyRegistered`] for an
    /// occupied slot.
    pub fn register_swi(
        &mut self,
        number: u32,
        handler: SwiHandler,
    ) -> Result<(), RegistrationError> {
        let index = (number & 0x007F_FFFF) as usize;
        if index as u32 == number || index >= self.swi_calls.len() {
            return Err(RegistrationError::InvalidSwiNumber(number));
        }
        if self.swi_calls[index].is_some() {
            return Err(RegistrationError::SwiAlreadyRegistered(number));
        }
        self.swi_calls[index] = Some(handler);
        Ok(())
    }

    /// Removes a host SWI callback.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidSwiNumber`] for numbers outside the
    /// host-call space.
    pub fn unregister_swi(&mut self, number: u32) -> Result<(), RegistrationError> {
        let index = (number & 0x007F_FFFF) as usize;
        if index as u32 == number || index >= self.swi_calls.len() {
            return Err(RegistrationError::InvalidSwiNumber(number));
        }
        self.swi_calls[index] = None;
        Ok(())
    }

    /// Core cycles executed since construction.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The current processor mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The PC the core will fetch from next.
    #[inline]
    pub fn next_pc(&self) -> u32 {
        self.regs.get(R_PC)
    }

    /// The live register file.
    #[inline]
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable access to the live register file (test setup, SWI shims).
    #[inline]
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Formats the internal processor state for diagnostics.
    pub fn debug_dump(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "core debug dump (mode {})", self.mode);
        for row in 0..4 {
            let _ = write!(out, "  ");
            for col in 0..4 {
                let idx = row * 4 + col;
                let _ = write!(out, "r{idx:<2} {:#010x}  ", self.regs.get(idx));
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "  cpsr {:#010x}", self.regs.cpsr());
        if self.mode.has_spsr() {
            let _ = writeln!(
                out,
                "  spsr_{} {:#010x}",
                self.mode,
                self.regs.spsr(self.mode)
            );
        }
        let _ = writeln!(
            out,
            "  ipipe {:#010x} {:#010x}  stage {}",
            self.ipipe[2], self.ipipe[1], self.cursor
        );
        let _ = write!(
            out,
            "  din {:#010x}  dout {:#010x}  addr {:#010x}",
            self.reg_data_in, self.reg_data_out, self.reg_addr
        );
        out
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("cycles", &self.cycles)
            .field("mode", &self.mode)
            .field("pc", &self.regs.get(R_PC))
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
