//! Banked register file.
//!
//! The live file holds R0-R15 plus the CPSR at index 16. Each mode owns a
//! shadow bank: User/System share one bank of R8-R14, FIQ shadows R8-R14
//! with its own SPSR, and IRQ/SVC/Abort/Undefined each shadow R13-R14 with
//! an SPSR. Exactly one bank is mapped into the live indices at any time;
//! [`RegisterFile::switch_mode`] performs the swap atomically, transferring
//! the CPSR into the incoming bank's SPSR on privileged entry and restoring
//! the saved SPSR as CPSR on return to the User bank.

use super::mode::Mode;
use super::psr::{FIQ_DISABLE, IRQ_DISABLE};

/// Stack pointer index.
pub const R_SP: usize = 13;
/// Link register index.
pub const R_LR: usize = 14;
/// Program counter index.
pub const R_PC: usize = 15;
/// CPSR pseudo-register index.
pub const R_CPSR: usize = 16;

/// Value returned for SPSR reads from modes that have none.
const NO_SPSR: u32 = 0xDEAD_DEAD;

/// The working registers and every mode's shadow bank.
#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    working: [u32; 17],
    user: [u32; 7],
    fiq: [u32; 7],
    fiq_spsr: u32,
    irq: [u32; 2],
    irq_spsr: u32,
    svc: [u32; 2],
    svc_spsr: u32,
    abort: [u32; 2],
    abort_spsr: u32,
    undef: [u32; 2],
    undef_spsr: u32,
}

impl RegisterFile {
    /// Creates a register file with all registers and banks zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a live register (0-15) or the CPSR (16).
    #[inline]
    pub fn get(&self, idx: usize) -> u32 {
        self.working[idx]
    }

    /// Writes a live register (0-15) or the CPSR (16).
    #[inline]
    pub fn set(&mut self, idx: usize, val: u32) {
        self.working[idx] = val;
    }

    /// Reads the CPSR.
    #[inline]
    pub fn cpsr(&self) -> u32 {
        self.working[R_CPSR]
    }

    /// Writes the CPSR.
    #[inline]
    pub fn set_cpsr(&mut self, val: u32) {
        self.working[R_CPSR] = val;
    }

    /// Reads the SPSR of the given mode.
    ///
    /// User and System have no SPSR; the decoder and datapath prevent such
    /// reads, so a poison value is returned rather than panicking.
    pub fn spsr(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Fiq => self.fiq_spsr,
            Mode::Irq => self.irq_spsr,
            Mode::Svc => self.svc_spsr,
            Mode::Abort => self.abort_spsr,
            Mode::Undef => self.undef_spsr,
            Mode::User | Mode::System => NO_SPSR,
        }
    }

    /// Writes the SPSR of the given mode; ignored for User/System.
    pub fn set_spsr(&mut self, mode: Mode, val: u32) {
        match mode {
            Mode::Fiq => self.fiq_spsr = val,
            Mode::Irq => self.irq_spsr = val,
            Mode::Svc => self.svc_spsr = val,
            Mode::Abort => self.abort_spsr = val,
            Mode::Undef => self.undef_spsr = val,
            Mode::User | Mode::System => {}
        }
    }

    /// Reads a register through the User bank regardless of current mode.
    ///
    /// Implements the LDM/STM S-bit access: while in FIQ, R8-R14 come from
    /// the User bank; in the other privileged modes only R13-R14 are
    /// banked. In User mode this is the plain register read.
    pub fn get_user_banked(&self, idx: usize, mode: Mode) -> u32 {
        let banked = match mode {
            Mode::User | Mode::System => false,
            Mode::Fiq => (8..=14).contains(&idx),
            _ => (13..=14).contains(&idx),
        };
        if banked {
            self.user[idx - 8]
        } else {
            self.working[idx]
        }
    }

    /// Writes a register through the User bank regardless of current mode.
    pub fn set_user_banked(&mut self, idx: usize, mode: Mode, val: u32) {
        let banked = match mode {
            Mode::User | Mode::System => false,
            Mode::Fiq => (8..=14).contains(&idx),
            _ => (13..=14).contains(&idx),
        };
        if banked {
            self.user[idx - 8] = val;
        } else {
            self.working[idx] = val;
        }
    }

    /// Switches the live bank from `outgoing` to `incoming`.
    ///
    /// Saves the outgoing mode's live registers into its shadow bank,
    /// captures the CPSR into the incoming bank's SPSR, loads the incoming
    /// bank, rewrites the CPSR mode field and forces the interrupt masks:
    /// FIQ entry disables IRQ and FIQ, the other privileged entries disable
    /// IRQ only, and return to the User bank restores the outgoing SPSR as
    /// the whole CPSR.
    ///
    /// # Arguments
    ///
    /// * `outgoing` - The mode whose bank is currently live.
    /// * `incoming` - The mode to make live.
    pub fn switch_mode(&mut self, outgoing: Mode, incoming: Mode) {
        let old_cpsr = self.working[R_CPSR];
        let mut old_spsr = None;

        // Park the outgoing mode's registers. Leaving FIQ also restores the
        // User copies of R8-R12, which FIQ alone shadows.
        match outgoing {
            Mode::Fiq => {
                self.fiq.copy_from_slice(&self.working[8..15]);
                old_spsr = Some(self.fiq_spsr);
                self.working[8..13].copy_from_slice(&self.user[0..5]);
            }
            Mode::User | Mode::System => {
                self.user.copy_from_slice(&self.working[8..15]);
            }
            _ => {
                let spsr = self.spsr(outgoing);
                let bank = match outgoing {
                    Mode::Irq => &mut self.irq,
                    Mode::Svc => &mut self.svc,
                    Mode::Abort => &mut self.abort,
                    _ => &mut self.undef,
                };
                bank.copy_from_slice(&self.working[R_SP..R_PC]);
                old_spsr = Some(spsr);
            }
        }

        // Map in the incoming bank and update the CPSR.
        match incoming {
            Mode::Fiq => {
                self.working[8..15].copy_from_slice(&self.fiq);
                self.fiq_spsr = old_cpsr;
                let cpsr =
                    (old_cpsr & !0x1F) | incoming.bits() | IRQ_DISABLE | FIQ_DISABLE;
                self.working[R_CPSR] = cpsr;
            }
            Mode::User | Mode::System => {
                self.working[R_SP..R_PC].copy_from_slice(&self.user[5..7]);
                if let Some(spsr) = old_spsr {
                    self.working[R_CPSR] = spsr;
                }
            }
            _ => {
                let bank = match incoming {
                    Mode::Irq => &self.irq,
                    Mode::Svc => &self.svc,
                    Mode::Abort => &self.abort,
                    _ => &self.undef,
                };
                self.working[R_SP..R_PC].copy_from_slice(bank);
                self.set_spsr(incoming, old_cpsr);
                self.working[R_CPSR] = (old_cpsr & !0x1F) | incoming.bits() | IRQ_DISABLE;
            }
        }
    }

    /// Clears the CPSR and every banked SPSR, as part of core reset.
    pub fn reset_psrs(&mut self) {
        self.working[R_CPSR] = 0;
        self.fiq_spsr = 0;
        self.irq_spsr = 0;
        self.svc_spsr = 0;
        self.abort_spsr = 0;
        self.undef_spsr = 0;
    }
}
