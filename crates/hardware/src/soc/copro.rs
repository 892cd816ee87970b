//! Coprocessor interface and the system coprocessor.
//!
//! Up to sixteen coprocessor slots hang off the coprocessor bus; every
//! one is cycled each processor cycle and watches the handshake lines
//! (cpi/cpa/cpb) plus the instruction-pipe marker to shadow-decode the
//! instruction stream. Slot 15 conventionally holds the system
//! coprocessor, which owns the ID/control registers, the event counters
//! and the cache-maintenance operations.
//!
//! The caches belong to the wrapper, so maintenance operations are not
//! performed here: the system coprocessor queues [`CacheOp`] requests and
//! the wrapper drains and applies them after cycling the slots.

use crate::common::bus::CoproBus;
use crate::isa::Inst;

/// Processor ID reported by the system coprocessor: ARM make, arch 3.
const SYS_ID: u32 = 0x4100_7000;

/// Register index of the cache-operations register.
const CACHE_REG: u32 = 0x7;
/// Register index mapped onto the event counters.
const COUNTER_REG: u32 = 0xB;

/// Cache-maintenance target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheTarget {
    /// The instruction cache.
    Instruction,
    /// The data cache.
    Data,
    /// Both caches.
    Unified,
}

/// A cache-maintenance request queued for the wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheOp {
    /// Which cache the operation addresses.
    pub target: CacheTarget,
    /// Invalidate one line (by word address) rather than everything.
    pub line: Option<u32>,
}

/// Events the wrapper reports into the system coprocessor's counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoproEvent {
    /// A cache lookup hit.
    CacheHit,
    /// A cache lookup missed.
    CacheMiss,
}

/// A coprocessor plugged into one of the sixteen slots.
pub trait Coprocessor: std::fmt::Debug + Send {
    /// Advances the coprocessor one cycle against the shared bus.
    fn cycle(&mut self, bus: &mut CoproBus);

    /// Returns the coprocessor to its power-on state.
    fn reset(&mut self) {}

    /// Feeds an event into the coprocessor's counters, if it keeps any.
    fn note_event(&mut self, _event: CoproEvent) {}

    /// Drains one queued cache-maintenance request, if this coprocessor
    /// issues them.
    fn take_cache_op(&mut self) -> Option<CacheOp> {
        None
    }

    /// Formats internal state for diagnostics.
    fn debug_dump(&self) -> String {
        String::new()
    }
}

/// One shadow-pipeline stage of the system coprocessor.
#[derive(Clone, Copy, Debug, Default)]
struct SysOp {
    /// Latch the data-out register onto the bus this stage.
    drive_out: bool,
    /// Latch the bus into the data-in register this stage.
    latch_in: bool,
    /// Commit the data-in register to `crd` this stage.
    write_reg: bool,
    /// Acknowledge the core's request this stage.
    ack: bool,
    /// Advance past this stage at the end of the cycle.
    advance: bool,
    /// Destination register index.
    crd: u32,
    /// Source register index.
    crm: u32,
    /// Opcode-2 field (counter select, cache-op select).
    op2: u32,
}

/// Stages the longest system-coprocessor recipe needs.
const SYS_MAX_OPS: usize = 5;

/// The system coprocessor (slot 15).
///
/// Mirrors the core's micro-coded structure in miniature: a three-deep
/// instruction pipe advanced on the opc marker, a current/next pair of
/// stage queues, and a register file with an ID register, a control
/// register, and counter/cache-operation registers.
#[derive(Clone, Debug)]
pub struct SysControl {
    regs: [u32; 16],
    counters: [u32; 3],
    ipipe: [u32; 3],
    cur: [Option<SysOp>; SYS_MAX_OPS],
    next: [Option<SysOp>; SYS_MAX_OPS],
    cursor: usize,
    data_in: u32,
    data_out: u32,
    pending_ops: Vec<CacheOp>,
}

impl Default for SysControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SysControl {
    /// Creates the system coprocessor in its power-on state.
    pub fn new() -> Self {
        let mut sys = Self {
            regs: [0; 16],
            counters: [0; 3],
            ipipe: [0; 3],
            cur: [None; SYS_MAX_OPS],
            next: [None; SYS_MAX_OPS],
            cursor: 0,
            data_in: 0,
            data_out: 0,
            pending_ops: Vec::new(),
        };
        sys.regs[0] = SYS_ID;
        sys.reset();
        sys
    }

    fn push_next(&mut self, op: SysOp) {
        for slot in &mut self.next {
            if slot.is_none() {
                *slot = Some(op);
                return;
            }
        }
    }

    /// Shadow-decodes the word in the decode slot. Only MRC/MCR aimed at
    /// coprocessor 15 mean anything here; everything else idles, since the
    /// core owns undefined-instruction trapping.
    fn decode(&mut self) {
        self.next = [None; SYS_MAX_OPS];

        let i = Inst(self.ipipe[1]);
        if i.cp_num() != 0xF || i.0 & 0x0F00_0010 != 0x0E00_0010 {
            self.push_next(SysOp::default());
            return;
        }

        if i.xfer_load() {
            // MRC: put the register on the data-out latch, then wait for
            // the transfer to complete.
            self.push_next(SysOp {
                drive_out: true,
                ack: true,
                advance: true,
                crm: i.cp_crn(),
                op2: i.cp_op2(),
                ..SysOp::default()
            });
            self.push_next(SysOp::default());
        } else {
            // MCR: acknowledge, take the data off the bus, file it.
            self.push_next(SysOp {
                ack: true,
                advance: true,
                ..SysOp::default()
            });
            self.push_next(SysOp {
                latch_in: true,
                advance: true,
                ..SysOp::default()
            });
            self.push_next(SysOp {
                write_reg: true,
                advance: true,
                crd: i.cp_crn(),
                crm: i.cp_crm(),
                op2: i.cp_op2(),
                ..SysOp::default()
            });
        }
    }

    /// A write to the cache-operations register queues maintenance work
    /// for the wrapper; `crm` selects the cache, `op2` whole-vs-line.
    fn queue_cache_op(&mut self, crm: u32, op2: u32, data: u32) {
        let target = match crm {
            5 => CacheTarget::Instruction,
            6 => CacheTarget::Data,
            7 => CacheTarget::Unified,
            _ => return,
        };
        let line = match op2 {
            0 => None,
            1 => Some(data),
            _ => return,
        };
        self.pending_ops.push(CacheOp { target, line });
    }

    fn exec(&mut self, bus: &CoproBus) {
        let Some(op) = self.cur.get(self.cursor).copied().flatten() else {
            // Recipe exhausted; only the pipe keeps moving.
            if bus.opc {
                self.ipipe[2] = self.ipipe[1];
                self.ipipe[1] = bus.din;
            }
            return;
        };

        let out_value = if op.crm == COUNTER_REG {
            self.counters[(op.op2 as usize).min(2)]
        } else {
            self.regs[(op.crm & 0xF) as usize]
        };
        let in_value = self.data_in;

        if op.write_reg {
            if op.crd == CACHE_REG {
                self.queue_cache_op(op.crm, op.op2, in_value);
            } else {
                self.regs[(op.crd & 0xF) as usize] = in_value;
            }
        }

        if op.latch_in {
            self.data_in = bus.din;
        }
        if op.drive_out {
            self.data_out = out_value;
        }

        if bus.opc {
            self.ipipe[2] = self.ipipe[1];
            self.ipipe[1] = bus.din;
        }
    }
}

impl Coprocessor for SysControl {
    fn cycle(&mut self, bus: &mut CoproBus) {
        // A pipe advance retires whatever recipe was in flight.
        if bus.opc {
            for slot in self.cur.iter_mut().skip(self.cursor) {
                *slot = None;
            }
            std::mem::swap(&mut self.cur, &mut self.next);
            self.cursor = 0;
        }

        // The core never asserted the request: it skipped (or annulled)
        // the instruction, so idle instead.
        if self.cursor == 0 && !bus.cpi {
            self.cur = [None; SYS_MAX_OPS];
            self.cur[0] = Some(SysOp::default());
        }

        if bus.opc {
            self.decode();
        }

        self.exec(bus);

        if let Some(op) = self.cur.get(self.cursor).copied().flatten() {
            if op.ack {
                bus.cpa = false;
            }
            if op.drive_out {
                bus.dw = true;
                bus.dout = self.data_out;
            } else {
                bus.dw = false;
            }

            if op.advance {
                self.cur[self.cursor] = None;
                self.cursor += 1;
            }
        }

        self.counters[0] = self.counters[0].wrapping_add(1);
    }

    fn reset(&mut self) {
        self.cur = [None; SYS_MAX_OPS];
        self.cur[0] = Some(SysOp::default());
        self.next = [None; SYS_MAX_OPS];
        self.next[0] = Some(SysOp::default());
        self.cursor = 0;
        self.counters = [0; 3];
        // Control register: MMU/cache enable out of reset.
        self.regs[1] = 0x0000_0001;
    }

    fn note_event(&mut self, event: CoproEvent) {
        match event {
            CoproEvent::CacheHit => self.counters[1] = self.counters[1].wrapping_add(1),
            CoproEvent::CacheMiss => self.counters[2] = self.counters[2].wrapping_add(1),
        }
    }

    fn take_cache_op(&mut self) -> Option<CacheOp> {
        if self.pending_ops.is_empty() {
            None
        } else {
            Some(self.pending_ops.remove(0))
        }
    }

    fn debug_dump(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "system coprocessor debug dump");
        for row in 0..4 {
            let _ = write!(out, "  ");
            for col in 0..4 {
                let _ = write!(out, "{:#010x}  ", self.regs[row * 4 + col]);
            }
            let _ = writeln!(out);
        }
        let _ = write!(
            out,
            "  din {:#010x}  dout {:#010x}  cycles {}",
            self.data_in, self.data_out, self.counters[0]
        );
        out
    }
}
