//! System Coprocessor Tests.
//!
//! Drives the shadow pipeline by hand, playing the core's side of the
//! bus: the instruction pipe advances on `opc`, the request asserts with
//! `cpi`, and MCR data arrives on `din` the cycle after the acknowledge.

use arm7_core::common::bus::CoproBus;
use arm7_core::soc::{CacheOp, CacheTarget, Coprocessor, CoproEvent, SysControl};
use pretty_assertions::assert_eq;

/// MCR p15, 0, rX, cN, cM, op2; only the coprocessor-side fields matter.
fn mcr(crn: u32, crm: u32, op2: u32) -> u32 {
    0xEE00_0F10 | (crn << 16) | (op2 << 5) | crm
}

/// MRC p15, 0, rX, cN, cM.
fn mrc(crn: u32) -> u32 {
    0xEE10_0F10 | (crn << 16)
}

/// Feeds one instruction through the shadow pipe so it sits in the
/// decode slot, then plays the handshake. Returns the bus after the
/// request cycle.
fn present(sys: &mut SysControl, word: u32) -> CoproBus {
    let mut bus = CoproBus::default();

    // Two pipe advances march the word into the decode slot.
    bus.opc = true;
    bus.din = word;
    sys.cycle(&mut bus);

    bus.din = 0; // next fetch
    sys.cycle(&mut bus);

    // The instruction reaches execute: the core asserts the request.
    bus.cpi = true;
    bus.cpa = true;
    sys.cycle(&mut bus);
    bus
}

/// An MCR to cp15 is acknowledged and files the data.
#[test]
fn mcr_writes_register() {
    let mut sys = SysControl::new();
    let mut bus = present(&mut sys, mcr(13, 0, 0)); // PID register

    assert!(!bus.cpa, "cp15 must acknowledge the MCR");

    // Data rides the bus the next cycle, then the commit stage runs.
    bus.opc = false;
    bus.cpi = false;
    bus.din = 0x5555_AAAA;
    sys.cycle(&mut bus);
    sys.cycle(&mut bus);

    // Read it back through MRC.
    let bus = present(&mut sys, mrc(13));
    assert!(!bus.cpa, "cp15 must acknowledge the MRC");
    assert!(bus.dw, "MRC must drive data out");
    assert_eq!(bus.dout, 0x5555_AAAA);
}

/// The ID register reads the ARM identity word.
#[test]
fn mrc_reads_id_register() {
    let mut sys = SysControl::new();
    let bus = present(&mut sys, mrc(0));
    assert!(bus.dw);
    assert_eq!(bus.dout, 0x4100_7000);
}

/// Instructions for other coprocessors are ignored: no acknowledge.
#[test]
fn foreign_coprocessor_is_ignored() {
    let mut sys = SysControl::new();
    let word = 0xEE00_0E10 | (7 << 16); // cpn = 14
    let bus = present(&mut sys, word);
    assert!(bus.cpa, "cp15 must not claim another coprocessor's MCR");
}

/// An MCR to the cache-operations register queues maintenance work.
#[test]
fn cache_op_register_queues_maintenance() {
    let mut sys = SysControl::new();
    let mut bus = present(&mut sys, mcr(7, 5, 0)); // crd=7, crm=5 (icache), op2=0

    bus.opc = false;
    bus.cpi = false;
    bus.din = 0;
    sys.cycle(&mut bus);
    sys.cycle(&mut bus);

    assert_eq!(
        sys.take_cache_op(),
        Some(CacheOp {
            target: CacheTarget::Instruction,
            line: None
        })
    );
    assert_eq!(sys.take_cache_op(), None);
}

/// Line-granular invalidation carries the address from the MCR data.
#[test]
fn cache_op_line_invalidate_carries_address() {
    let mut sys = SysControl::new();
    let mut bus = present(&mut sys, mcr(7, 6, 1)); // dcache, by line

    bus.opc = false;
    bus.cpi = false;
    bus.din = 0x0000_0123;
    sys.cycle(&mut bus);
    sys.cycle(&mut bus);

    assert_eq!(
        sys.take_cache_op(),
        Some(CacheOp {
            target: CacheTarget::Data,
            line: Some(0x0000_0123)
        })
    );
}

/// Cache events land in the counters behind the counter register.
#[test]
fn event_counters_accumulate() {
    let mut sys = SysControl::new();
    sys.note_event(CoproEvent::CacheHit);
    sys.note_event(CoproEvent::CacheHit);
    sys.note_event(CoproEvent::CacheMiss);

    // MRC of the counter register, op2 selecting the hit counter.
    let word = 0xEE10_0F10 | (0xB << 16) | (1 << 5);
    let bus = present(&mut sys, word);
    assert!(bus.dw);
    assert_eq!(bus.dout, 2);
}
