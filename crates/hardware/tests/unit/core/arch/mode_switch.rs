//! Banked Register File Tests.
//!
//! The mode-switch invariant: entering a privileged mode and returning
//! with no writes in between restores every register and the original
//! CPSR bit-for-bit. FIQ shadows R8-R14; the other privileged modes
//! shadow R13-R14 only.

use arm7_core::core::arch::{FIQ_DISABLE, IRQ_DISABLE, Mode, RegisterFile};
use pretty_assertions::assert_eq;

fn seeded_file(mode: Mode) -> RegisterFile {
    let mut rf = RegisterFile::new();
    for i in 0..16 {
        rf.set(i, 0x1000 + i as u32);
    }
    rf.set_cpsr(0x6000_0000 | mode.bits()); // Z and C set, no masks
    rf
}

fn snapshot(rf: &RegisterFile) -> Vec<u32> {
    (0..16).map(|i| rf.get(i)).collect()
}

/// Round-trip through every privileged mode from User.
#[test]
fn round_trip_restores_registers_and_cpsr() {
    for target in [Mode::Fiq, Mode::Irq, Mode::Svc, Mode::Abort, Mode::Undef] {
        let mut rf = seeded_file(Mode::User);
        let before_regs = snapshot(&rf);
        let before_cpsr = rf.cpsr();

        rf.switch_mode(Mode::User, target);
        rf.switch_mode(target, Mode::User);

        assert_eq!(snapshot(&rf), before_regs, "registers after {target}");
        assert_eq!(rf.cpsr(), before_cpsr, "cpsr after {target}");
    }
}

/// Entry rewrites the mode field, captures the old CPSR in the new SPSR,
/// and forces the interrupt masks: both for FIQ, IRQ-only otherwise.
#[test]
fn entry_sets_mode_masks_and_spsr() {
    let mut rf = seeded_file(Mode::User);
    let old_cpsr = rf.cpsr();

    rf.switch_mode(Mode::User, Mode::Irq);
    assert_eq!(rf.cpsr() & 0x1F, Mode::Irq.bits());
    assert_ne!(rf.cpsr() & IRQ_DISABLE, 0);
    assert_eq!(rf.cpsr() & FIQ_DISABLE, 0);
    assert_eq!(rf.spsr(Mode::Irq), old_cpsr);

    let mut rf = seeded_file(Mode::User);
    let old_cpsr = rf.cpsr();
    rf.switch_mode(Mode::User, Mode::Fiq);
    assert_ne!(rf.cpsr() & IRQ_DISABLE, 0);
    assert_ne!(rf.cpsr() & FIQ_DISABLE, 0);
    assert_eq!(rf.spsr(Mode::Fiq), old_cpsr);
}

/// FIQ gets its own R8-R14; writes there never leak into the User bank.
#[test]
fn fiq_bank_isolates_r8_to_r14() {
    let mut rf = seeded_file(Mode::User);

    rf.switch_mode(Mode::User, Mode::Fiq);
    for i in 8..15 {
        rf.set(i, 0xF100_0000u32.wrapping_add(i as u32));
    }
    rf.switch_mode(Mode::Fiq, Mode::User);

    for i in 8..15 {
        assert_eq!(rf.get(i), 0x1000 + i as u32, "r{i} leaked from FIQ");
    }
}

/// IRQ shadows only R13-R14; R8-R12 stay shared with the User bank.
#[test]
fn irq_bank_isolates_sp_and_lr_only() {
    let mut rf = seeded_file(Mode::User);

    rf.switch_mode(Mode::User, Mode::Irq);
    rf.set(12, 0xAAAA_0000);
    rf.set(13, 0xBBBB_0000);
    rf.set(14, 0xCCCC_0000);
    rf.switch_mode(Mode::Irq, Mode::User);

    // R12 is shared, R13/R14 were banked.
    assert_eq!(rf.get(12), 0xAAAA_0000);
    assert_eq!(rf.get(13), 0x1000 + 13);
    assert_eq!(rf.get(14), 0x1000 + 14);
}

/// Each privileged mode keeps its own SP/LR across re-entry.
#[test]
fn banked_sp_survives_reentry() {
    let mut rf = seeded_file(Mode::User);

    rf.switch_mode(Mode::User, Mode::Svc);
    rf.set(13, 0x5C00_0000);
    rf.switch_mode(Mode::Svc, Mode::User);
    rf.switch_mode(Mode::User, Mode::Svc);

    assert_eq!(rf.get(13), 0x5C00_0000);
}

/// User-bank access from privileged modes reads and writes the shadow
/// copies, not the live FIQ/IRQ registers.
#[test]
fn user_banked_access_from_privileged_modes() {
    let mut rf = seeded_file(Mode::User);

    rf.switch_mode(Mode::User, Mode::Fiq);
    rf.set(10, 0xFFFF_0000);

    assert_eq!(rf.get(10), 0xFFFF_0000);
    assert_eq!(rf.get_user_banked(10, Mode::Fiq), 0x1000 + 10);

    rf.set_user_banked(10, Mode::Fiq, 0x1234_5678);
    assert_eq!(rf.get(10), 0xFFFF_0000, "live FIQ r10 must not change");

    rf.switch_mode(Mode::Fiq, Mode::User);
    assert_eq!(rf.get(10), 0x1234_5678);
}
