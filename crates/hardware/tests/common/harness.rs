//! Bare-core harness.
//!
//! Drives a [`Core`] directly against a flat word-array memory, mimicking
//! the wrapper's bus protocol (read service, deferred write-through) but
//! with no caches, so nothing stalls: every instruction costs exactly its
//! recipe length in cycles.

use arm7_core::Core;
use arm7_core::common::bus::{CoreBus, Width};

/// A bare core plus flat memory.
pub struct CoreHarness {
    /// The core under test.
    pub core: Core,
    /// The shared core bus.
    pub bus: CoreBus,
    /// Word-addressed memory; the program loads at word 0.
    pub mem: Vec<u32>,
    write_pending: bool,
    addr_prev: u32,
}

impl CoreHarness {
    /// Creates a harness with the program at address 0 and 4 KiB of
    /// zero-filled memory behind it.
    pub fn new(program: &[u32]) -> Self {
        let mut mem = vec![0u32; 1024];
        mem[..program.len()].copy_from_slice(program);
        Self {
            core: Core::new(),
            bus: CoreBus::default(),
            mem,
            write_pending: false,
            addr_prev: 0,
        }
    }

    fn service_write(&mut self) {
        // The wrapper samples the width before clocking the core, then
        // writes the data the core drives during this cycle.
        let width = self.bus.bw;
        self.core.cycle(&mut self.bus);

        let addr = self.addr_prev;
        let idx = ((addr & !0x3) >> 2) as usize;
        if let Some(slot) = self.mem.get_mut(idx) {
            match width {
                Width::Word => *slot = self.bus.dout,
                Width::Byte => {
                    let sh = (addr & 0x3) * 8;
                    *slot = (*slot & !(0xFF << sh)) | ((self.bus.dout & 0xFF) << sh);
                }
                Width::Half => {
                    if addr & 0x2 == 0 {
                        *slot = (*slot & 0xFFFF_0000) | (self.bus.dout & 0x0000_FFFF);
                    } else {
                        *slot = (*slot & 0x0000_FFFF) | (self.bus.dout << 16);
                    }
                }
            }
        }

        self.write_pending = self.bus.rw && !self.bus.enout;
        if self.write_pending {
            self.addr_prev = self.bus.a;
        }
    }

    /// Runs one core cycle with bus service.
    pub fn step(&mut self) {
        self.bus.swi_flush = false;

        if self.write_pending {
            self.service_write();
            return;
        }

        let a = self.bus.a;
        if a & 0x8000_0000 == 0 {
            let word = self.mem.get(((a & !0x3) >> 2) as usize).copied().unwrap_or(0);
            self.bus.din = match self.bus.bw {
                Width::Word => word.rotate_right((a & 0x3) * 8),
                Width::Byte => (word >> ((a & 0x3) * 8)) & 0x0000_00FF,
                Width::Half => {
                    if a & 0x2 != 0 {
                        word >> 16
                    } else {
                        word & 0x0000_FFFF
                    }
                }
            };
        }

        self.core.cycle(&mut self.bus);

        if self.bus.rw && !self.bus.enout {
            self.write_pending = true;
            self.addr_prev = self.bus.a;
        }
    }

    /// Runs a fixed number of cycles.
    pub fn run(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Runs until the predicate holds, up to a cycle cap.
    ///
    /// # Returns
    ///
    /// `true` if the predicate fired within the cap.
    pub fn run_until(&mut self, cap: usize, mut pred: impl FnMut(&Self) -> bool) -> bool {
        for _ in 0..cap {
            if pred(self) {
                return true;
            }
            self.step();
        }
        false
    }

    /// Reads a live register.
    pub fn reg(&self, idx: usize) -> u32 {
        self.core.registers().get(idx)
    }

    /// Writes a live register.
    pub fn set_reg(&mut self, idx: usize, val: u32) {
        self.core.registers_mut().set(idx, val);
    }

    /// Reads the CPSR.
    pub fn cpsr(&self) -> u32 {
        self.core.registers().cpsr()
    }
}
