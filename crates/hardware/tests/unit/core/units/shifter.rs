//! Barrel Shifter Tests.
//!
//! The boundary behaviour at distances 0 and 32 is the highest-risk area:
//! each opcode has its own rule there, and several differ from what the
//! host shift instructions would do. Every case from the documented table
//! is pinned here, including distances past 32.

use arm7_core::core::units::shifter::{ShiftType, shift};
use pretty_assertions::assert_eq;
use rstest::rstest;

const VAL: u32 = 0x8000_0001;

// ─── LSL ─────────────────────────────────────────────────────────────────────

/// LSL #0 passes the value through and propagates the current carry.
#[rstest]
#[case(false)]
#[case(true)]
fn lsl_zero_is_passthrough(#[case] carry_in: bool) {
    assert_eq!(shift(VAL, ShiftType::Lsl, 0, carry_in), (VAL, carry_in));
}

#[test]
fn lsl_by_one() {
    assert_eq!(shift(VAL, ShiftType::Lsl, 1, false), (0x0000_0002, true));
}

#[test]
fn lsl_by_31() {
    assert_eq!(shift(0x0000_0003, ShiftType::Lsl, 31, false), (0x8000_0000, true));
}

/// LSL #32: result 0, carry = bit 0 of the input.
#[test]
fn lsl_by_32_carry_is_bit0() {
    assert_eq!(shift(VAL, ShiftType::Lsl, 32, false), (0, true));
    assert_eq!(shift(0xFFFF_FFFE, ShiftType::Lsl, 32, true), (0, false));
}

/// LSL by more than 32: result 0, carry 0.
#[rstest]
#[case(33)]
#[case(63)]
#[case(64)]
fn lsl_past_32_is_zero(#[case] dist: u32) {
    assert_eq!(shift(0xFFFF_FFFF, ShiftType::Lsl, dist, true), (0, false));
}

// ─── LSR ─────────────────────────────────────────────────────────────────────

#[rstest]
#[case(false)]
#[case(true)]
fn lsr_zero_is_passthrough(#[case] carry_in: bool) {
    assert_eq!(shift(VAL, ShiftType::Lsr, 0, carry_in), (VAL, carry_in));
}

#[test]
fn lsr_by_one() {
    assert_eq!(shift(VAL, ShiftType::Lsr, 1, false), (0x4000_0000, true));
}

#[test]
fn lsr_by_31() {
    assert_eq!(shift(VAL, ShiftType::Lsr, 31, false), (0x0000_0001, false));
}

/// LSR #32: result 0, carry = bit 31 of the input.
#[test]
fn lsr_by_32_carry_is_bit31() {
    assert_eq!(shift(VAL, ShiftType::Lsr, 32, false), (0, true));
    assert_eq!(shift(0x7FFF_FFFF, ShiftType::Lsr, 32, true), (0, false));
}

#[rstest]
#[case(33)]
#[case(63)]
#[case(64)]
fn lsr_past_32_is_zero(#[case] dist: u32) {
    assert_eq!(shift(0xFFFF_FFFF, ShiftType::Lsr, dist, true), (0, false));
}

// ─── ASR ─────────────────────────────────────────────────────────────────────

#[rstest]
#[case(false)]
#[case(true)]
fn asr_zero_is_passthrough(#[case] carry_in: bool) {
    assert_eq!(shift(VAL, ShiftType::Asr, 0, carry_in), (VAL, carry_in));
}

#[test]
fn asr_by_one_extends_sign() {
    assert_eq!(shift(VAL, ShiftType::Asr, 1, false), (0xC000_0000, true));
    assert_eq!(shift(0x4000_0000, ShiftType::Asr, 1, false), (0x2000_0000, false));
}

#[test]
fn asr_by_31() {
    assert_eq!(shift(VAL, ShiftType::Asr, 31, false), (0xFFFF_FFFF, false));
}

/// ASR at 32 and beyond: the sign bit floods the result and the carry.
#[rstest]
#[case(32)]
#[case(33)]
#[case(64)]
fn asr_at_or_past_32_floods_sign(#[case] dist: u32) {
    assert_eq!(shift(VAL, ShiftType::Asr, dist, false), (0xFFFF_FFFF, true));
    assert_eq!(shift(0x7FFF_FFFF, ShiftType::Asr, dist, true), (0, false));
}

// ─── ROR ─────────────────────────────────────────────────────────────────────

#[rstest]
#[case(false)]
#[case(true)]
fn ror_zero_is_passthrough(#[case] carry_in: bool) {
    assert_eq!(shift(VAL, ShiftType::Ror, 0, carry_in), (VAL, carry_in));
}

#[test]
fn ror_by_one() {
    assert_eq!(shift(VAL, ShiftType::Ror, 1, false), (0xC000_0000, true));
}

#[test]
fn ror_by_eight() {
    assert_eq!(shift(0x0000_00FF, ShiftType::Ror, 8, false), (0xFF00_0000, true));
}

/// ROR by a nonzero multiple of 32: value unchanged, carry = bit 31.
#[rstest]
#[case(32)]
#[case(64)]
fn ror_multiple_of_32_is_value_noop(#[case] dist: u32) {
    assert_eq!(shift(VAL, ShiftType::Ror, dist, false), (VAL, true));
    assert_eq!(shift(0x7FFF_FFFF, ShiftType::Ror, dist, false), (0x7FFF_FFFF, false));
}

/// ROR distances mask to 5 bits otherwise.
#[test]
fn ror_masks_distance_to_5_bits() {
    let expected = shift(VAL, ShiftType::Ror, 1, false);
    assert_eq!(shift(VAL, ShiftType::Ror, 33, false), expected);
}

// ─── RRX ─────────────────────────────────────────────────────────────────────

/// RRX rotates one bit right through the carry flag.
#[test]
fn rrx_rotates_through_carry() {
    assert_eq!(shift(VAL, ShiftType::Rrx, 1, false), (0x4000_0000, true));
    assert_eq!(shift(VAL, ShiftType::Rrx, 1, true), (0xC000_0000, true));
    assert_eq!(shift(0x0000_0002, ShiftType::Rrx, 1, true), (0x8000_0001, false));
}
