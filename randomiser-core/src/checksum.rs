//! Cartridge header checksums.
//!
//! The boot ROM refuses to start a cartridge whose header checksum at
//! `0x14D` is wrong. The 16-bit global checksum at `0x14E..0x150` is not
//! checked by hardware but emulators and flash carts report it, so it is
//! kept consistent as well. GBC cartridges carry no per-bank checksums.

use thiserror::Error;

use crate::image::RomImage;

pub const HEADER_CHECKSUM_OFFSET: usize = 0x14D;
pub const GLOBAL_CHECKSUM_OFFSET: usize = 0x14E;
const HEADER_CHECKSUM_RANGE: std::ops::RangeInclusive<usize> = 0x134..=0x14C;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChecksumError {
    #[error("image length changed from {expected} to {actual} bytes")]
    LengthCorrupted { expected: usize, actual: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChecksumReport {
    pub header_stored: u8,
    pub header_computed: u8,
    pub global_stored: u16,
    pub global_computed: u16,
}

impl ChecksumReport {
    pub fn is_valid(&self) -> bool {
        self.header_stored == self.header_computed && self.global_stored == self.global_computed
    }
}

pub fn compute_header_checksum(data: &[u8]) -> u8 {
    data[HEADER_CHECKSUM_RANGE]
        .iter()
        .fold(0u8, |x, &b| x.wrapping_sub(b).wrapping_sub(1))
}

/// Big-endian sum of every byte except the two global checksum bytes.
pub fn compute_global_checksum(data: &[u8]) -> u16 {
    data.iter()
        .enumerate()
        .filter(|(i, _)| *i != GLOBAL_CHECKSUM_OFFSET && *i != GLOBAL_CHECKSUM_OFFSET + 1)
        .fold(0u16, |sum, (_, &b)| sum.wrapping_add(b as u16))
}

pub fn verify(image: &RomImage) -> ChecksumReport {
    let data = image.as_bytes();
    ChecksumReport {
        header_stored: data[HEADER_CHECKSUM_OFFSET],
        header_computed: compute_header_checksum(data),
        global_stored: u16::from_be_bytes([
            data[GLOBAL_CHECKSUM_OFFSET],
            data[GLOBAL_CHECKSUM_OFFSET + 1],
        ]),
        global_computed: compute_global_checksum(data),
    }
}

/// Rewrites both checksum fields. The header checksum goes first since the
/// global sum covers it.
pub fn fix_checksums(image: &mut RomImage) -> Result<ChecksumReport, ChecksumError> {
    if image.len() != image.loaded_len() {
        return Err(ChecksumError::LengthCorrupted {
            expected: image.loaded_len(),
            actual: image.len(),
        });
    }

    let data = image.bytes_mut();
    let header = compute_header_checksum(data);
    data[HEADER_CHECKSUM_OFFSET] = header;
    let global = compute_global_checksum(data);
    data[GLOBAL_CHECKSUM_OFFSET..GLOBAL_CHECKSUM_OFFSET + 2].copy_from_slice(&global.to_be_bytes());

    Ok(verify(image))
}
