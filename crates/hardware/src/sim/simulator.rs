//! Top-level drive loop.
//!
//! The simulator owns the processor and the driver memory side by side
//! and steps them in lockstep: one processor bus cycle, then one memory
//! service pass over whatever request was left on the pins. External
//! interrupt pins are re-driven from the simulator's own latches every
//! cycle, so a one-cycle replay by the wrapper does not wedge the line.

use crate::common::bus::Pinout;
use crate::common::error::BusFault;
use crate::config::Config;
use crate::sim::memory::Memory;
use crate::soc::ArmProcessor;

/// Top-level simulator: processor + driver memory + pin state.
#[derive(Debug)]
pub struct Simulator {
    /// The processor (core, caches, peripherals, coprocessors).
    pub processor: ArmProcessor,
    /// The driver memory.
    pub memory: Memory,
    pinout: Pinout,
    pin_fiq: bool,
    pin_irq: bool,
}

impl Simulator {
    /// Builds a simulator from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            processor: ArmProcessor::new(config),
            memory: Memory::new(config.memory.size),
            pinout: Pinout::default(),
            pin_fiq: true,
            pin_irq: true,
        }
    }

    /// Drives the external FIQ pin (active-low).
    pub fn set_fiq_pin(&mut self, level: bool) {
        self.pin_fiq = level;
    }

    /// Drives the external IRQ pin (active-low).
    pub fn set_irq_pin(&mut self, level: bool) {
        self.pin_irq = level;
    }

    /// Advances the system by one bus cycle.
    ///
    /// # Errors
    ///
    /// [`BusFault`] if the processor addressed memory out of range.
    pub fn step(&mut self) -> Result<(), BusFault> {
        self.pinout.fiq = self.pin_fiq;
        self.pinout.irq = self.pin_irq;

        self.processor.cycle(&mut self.pinout);
        self.memory.service(&mut self.pinout)
    }

    /// Runs a number of bus cycles.
    ///
    /// # Errors
    ///
    /// [`BusFault`] on the first out-of-range access.
    pub fn run(&mut self, cycles: u64) -> Result<(), BusFault> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }
}
