//! Loader Tests.

use arm7_core::sim::{Memory, LoaderError, load_binary, load_srec};
use pretty_assertions::assert_eq;

#[test]
fn flat_binary_loads_little_endian() {
    let mut mem = Memory::new(0x1000);
    load_binary(&mut mem, &[0xDD, 0xCC, 0xBB, 0xAA, 0x01], 0).unwrap();

    assert_eq!(mem.read_word(0).unwrap(), 0xAABB_CCDD);
    assert_eq!(mem.read_word(4).unwrap(), 0x0000_0001);
}

#[test]
fn flat_binary_out_of_range_faults() {
    let mut mem = Memory::new(8);
    assert!(load_binary(&mut mem, &[0; 16], 0).is_err());
}

/// S1 records carry 16-bit addresses; S9 terminates with the entry.
#[test]
fn srec_s1_with_entry() {
    // S1: count 07, addr 0010, data DD CC BB AA, checksum.
    // sum = 07+00+10+DD+CC+BB+AA = 0x325 -> low byte 25 -> checksum DA.
    // S9: count 03, addr 0000, checksum FC.
    let text = "S1070010DDCCBBAADA\nS9030000FC\n".to_string();
    let mut mem = Memory::new(0x1000);
    let entry = load_srec(&mut mem, &text).unwrap();

    assert_eq!(mem.read_word(0x10).unwrap(), 0xAABB_CCDD);
    assert_eq!(entry, Some(0));
}

/// S3 records carry 32-bit addresses.
#[test]
fn srec_s3_loads_wide_address() {
    // S3: count 09, addr 00000100, data 01 02 03 04.
    // sum = 09+00+00+01+00+01+02+03+04 = 0x14 -> checksum EB.
    let text = "S3090000010001020304EB";
    let mut mem = Memory::new(0x1000);
    load_srec(&mut mem, text).unwrap();

    assert_eq!(mem.read_word(0x100).unwrap(), 0x0403_0201);
}

#[test]
fn srec_bad_checksum_is_rejected() {
    let mut mem = Memory::new(0x1000);
    assert_eq!(
        load_srec(&mut mem, "S1070010DDCCBBAADB"),
        Err(LoaderError::Checksum { line: 1 })
    );
}

#[test]
fn srec_bad_hex_is_rejected() {
    let mut mem = Memory::new(0x1000);
    assert_eq!(
        load_srec(&mut mem, "S107001GDDCCBBAA3A"),
        Err(LoaderError::InvalidHex { line: 1 })
    );
}

#[test]
fn srec_header_is_ignored() {
    // S0 header record with arbitrary payload.
    // S0: count 03, addr 0000 -> sum 03, checksum FC.
    let text = "S0030000FC\nS9030000FC";
    let mut mem = Memory::new(0x1000);
    assert_eq!(load_srec(&mut mem, text).unwrap(), Some(0));
}

#[test]
fn srec_short_record_is_rejected() {
    let mut mem = Memory::new(0x1000);
    assert!(matches!(
        load_srec(&mut mem, "S1"),
        Err(LoaderError::InvalidRecord { line: 1 })
    ));
}
