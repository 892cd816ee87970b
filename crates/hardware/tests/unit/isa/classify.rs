//! Classification Tests.
//!
//! The overlapping ARM encodings make classification order-sensitive;
//! these pin one representative word per class plus the encodings that
//! most easily land in the wrong matcher (PSR transfers inside the
//! data-processing space, multiplies and swaps inside the bit4/bit7
//! corner, NV-condition words).

use arm7_core::isa::{Inst, InstClass, classify};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(0xEA00_0000, InstClass::Branch)] // B
#[case(0xEB00_0010, InstClass::Branch)] // BL
#[case(0xEF00_0042, InstClass::SoftwareInterrupt)] // SWI
#[case(0xE000_0291, InstClass::Multiply)] // MUL r0, r1, r2
#[case(0xE083_2190, InstClass::Multiply)] // UMULL r2, r3, r0, r1
#[case(0xE0E3_2190, InstClass::Multiply)] // SMLAL
#[case(0xE3A0_0005, InstClass::DataProcessing)] // MOV r0, #5
#[case(0xE091_0002, InstClass::DataProcessing)] // ADDS r0, r1, r2
#[case(0xE1A0_0311, InstClass::DataProcessing)] // MOV r0, r1, LSL r3
#[case(0xE590_1000, InstClass::SingleTransfer)] // LDR r1, [r0]
#[case(0xE5C0_1000, InstClass::SingleTransfer)] // STRB
#[case(0xE1D3_20B0, InstClass::HalfTransfer)] // LDRH r2, [r3]
#[case(0xE1C3_20B0, InstClass::HalfTransfer)] // STRH
#[case(0xE1D3_20F0, InstClass::HalfTransfer)] // LDRSH
#[case(0xE890_00FF, InstClass::MultipleTransfer)] // LDMIA
#[case(0xE880_00FF, InstClass::MultipleTransfer)] // STMIA
#[case(0xE103_2091, InstClass::Swap)] // SWP r2, r1, [r3]
#[case(0xE143_2091, InstClass::Swap)] // SWPB
#[case(0xE10F_1000, InstClass::Mrs)] // MRS r1, CPSR
#[case(0xE14F_1000, InstClass::Mrs)] // MRS r1, SPSR
#[case(0xE129_F001, InstClass::Msr)] // MSR CPSR_fc, r1
#[case(0xE328_F00F, InstClass::Msr)] // MSR CPSR_f, #imm
#[case(0xEE42_1103, InstClass::CoproDataOp)] // CDP
#[case(0xED93_2100, InstClass::CoproDataTransfer)] // LDC
#[case(0xED83_2100, InstClass::CoproDataTransfer)] // STC
#[case(0xEE11_2F10, InstClass::CoproRegTransfer)] // MRC p15
#[case(0xEE01_2F10, InstClass::CoproRegTransfer)] // MCR p15
fn classifies_representative_words(#[case] word: u32, #[case] expected: InstClass) {
    assert_eq!(classify(Inst(word)), expected, "{word:#010x}");
}

/// NV-condition words are undefined regardless of the rest of the bits.
#[rstest]
#[case(0xF3A0_0005)]
#[case(0xFA00_0000)]
#[case(0xF590_1000)]
fn nv_condition_is_undefined(#[case] word: u32) {
    assert_eq!(classify(Inst(word)), InstClass::Undefined);
}

/// The architected undefined space (011 with bit 4 set) falls through.
#[test]
fn architected_undefined_space() {
    assert_eq!(classify(Inst(0xE7F0_00F0)), InstClass::Undefined);
}

/// TST/TEQ/CMP/CMN without S are PSR transfers, not data processing.
#[test]
fn test_ops_without_s_are_psr_transfers() {
    assert_eq!(classify(Inst(0xE10F_0000)), InstClass::Mrs);
    assert_eq!(classify(Inst(0xE121_F000)), InstClass::Msr);
    // With S set they are ordinary flag-setting ops.
    assert_eq!(classify(Inst(0xE111_0002)), InstClass::DataProcessing); // TST r1, r2
    assert_eq!(classify(Inst(0xE151_0002)), InstClass::DataProcessing); // CMP r1, r2
}

/// Multiplies and swaps share bits 7:4 = 1001; bits 27:24 disambiguate.
#[test]
fn mult_swap_corner() {
    assert_eq!(classify(Inst(0xE000_0091)), InstClass::Multiply);
    assert_eq!(classify(Inst(0xE100_0091)), InstClass::Swap);
    // Register-offset LDRH also has bit 7 and bit 4 set but SH != 00.
    assert_eq!(classify(Inst(0xE19320B1)), InstClass::HalfTransfer);
}

/// Field extraction sanity for the encodings the decoder leans on.
#[test]
fn field_extraction() {
    let i = Inst(0xE083_2190); // UMULL r2, r3, r0, r1
    assert_eq!(i.cond(), 0xE);
    assert_eq!(i.mult_opcode(), 4);
    assert_eq!(i.mult_rd(), 3);
    assert_eq!(i.mult_rn(), 2);
    assert_eq!(i.rs(), 1);
    assert_eq!(i.rm(), 0);

    let i = Inst(0xE592_1004); // LDR r1, [r2, #4]
    assert_eq!(i.rn(), 2);
    assert_eq!(i.rd(), 1);
    assert!(i.xfer_load());
    assert!(i.xfer_pre());
    assert!(i.xfer_up());
    assert!(!i.swt_is_reg_offset());

    let i = Inst(0xEE11_2F10); // MRC p15, 0, r2, c1, c0
    assert_eq!(i.cp_num(), 0xF);
    assert_eq!(i.cp_crn(), 1);
    assert_eq!(i.rd(), 2);
    assert!(i.xfer_load());
}
