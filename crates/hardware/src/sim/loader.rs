//! Image loaders.
//!
//! Two formats cover the test binaries: raw flat images copied to a base
//! address, and Motorola S-records (S1/S2/S3 data, S7/S8/S9 entry, S0
//! header ignored). Checksums are verified; a bad record names its line.

use thiserror::Error;

use super::memory::Memory;
use crate::common::error::BusFault;

/// S-record parsing failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoaderError {
    /// A record was malformed (bad type, short payload).
    #[error("malformed S-record at line {line}")]
    InvalidRecord {
        /// 1-based line number.
        line: usize,
    },
    /// A record contained a non-hex character.
    #[error("invalid hex digit at line {line}")]
    InvalidHex {
        /// 1-based line number.
        line: usize,
    },
    /// A record's checksum did not match its payload.
    #[error("checksum mismatch at line {line}")]
    Checksum {
        /// 1-based line number.
        line: usize,
    },
    /// A record addressed memory out of range.
    #[error(transparent)]
    Bus(#[from] BusFault),
}

/// Copies a flat binary image into memory.
///
/// # Arguments
///
/// * `memory` - The driver memory.
/// * `image`  - The raw bytes.
/// * `base`   - Load address.
///
/// # Errors
///
/// [`BusFault`] if the image runs past the end of memory.
pub fn load_binary(memory: &mut Memory, image: &[u8], base: u32) -> Result<(), BusFault> {
    memory.load_bytes(base, image)
}

/// Parses hex bytes out of one record's payload.
fn hex_bytes(payload: &str, line: usize) -> Result<Vec<u8>, LoaderError> {
    if payload.len() % 2 != 0 {
        return Err(LoaderError::InvalidRecord { line });
    }
    (0..payload.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&payload[i..i + 2], 16)
                .map_err(|_| LoaderError::InvalidHex { line })
        })
        .collect()
}

/// Loads a Motorola S-record image into memory.
///
/// # Arguments
///
/// * `memory` - The driver memory.
/// * `text`   - The S-record file contents.
///
/// # Returns
///
/// The entry address from the terminating S7/S8/S9 record, if present.
///
/// # Errors
///
/// [`LoaderError`] naming the offending line.
pub fn load_srec(memory: &mut Memory, text: &str) -> Result<Option<u32>, LoaderError> {
    let mut entry = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = idx + 1;
        let record = raw_line.trim();
        if record.is_empty() {
            continue;
        }

        let Some(kind) = record.strip_prefix('S').and_then(|r| r.chars().next()) else {
            return Err(LoaderError::InvalidRecord { line });
        };

        let bytes = hex_bytes(&record[2..], line)?;
        let Some((&count, payload)) = bytes.split_first() else {
            return Err(LoaderError::InvalidRecord { line });
        };
        if payload.len() != usize::from(count) {
            return Err(LoaderError::InvalidRecord { line });
        }

        // Checksum: ones' complement of the byte sum, count included.
        let Some((&checksum, payload)) = payload.split_last() else {
            return Err(LoaderError::InvalidRecord { line });
        };
        let sum = payload
            .iter()
            .fold(u32::from(count), |acc, &b| acc + u32::from(b));
        if checksum != !(sum as u8) {
            return Err(LoaderError::Checksum { line });
        }

        let addr_len = match kind {
            '0' => continue,
            '1' | '9' => 2,
            '2' | '8' => 3,
            '3' | '7' => 4,
            '5' | '6' => continue,
            _ => return Err(LoaderError::InvalidRecord { line }),
        };
        if payload.len() < addr_len {
            return Err(LoaderError::InvalidRecord { line });
        }
        let (addr_bytes, data) = payload.split_at(addr_len);
        let addr = addr_bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        match kind {
            '1' | '2' | '3' => memory.load_bytes(addr, data)?,
            _ => entry = Some(addr),
        }
    }

    Ok(entry)
}
