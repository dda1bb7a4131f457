//! Integration tests only see the public API, and `src/test_support.rs` is
//! `cfg(test)` inside the library, so its builders are mirrored here byte
//! for byte. Keep the two in step.

#![allow(dead_code)]

use std::ops::Range;

use randomiser_core::checksum::{self, compute_global_checksum, compute_header_checksum};
use randomiser_core::image::{
    LOGO_OFFSET, MIN_ROM_SIZE, NINTENDO_LOGO, ROM_SIZE_CODE_OFFSET, TITLE_OFFSET,
};
use randomiser_core::items::{build_held_item_pool, build_static_item_pool};
use randomiser_core::schema::{
    self, Codec, Layout, MAX_PARTY_SIZE, MAX_SPECIES, PALETTE_COUNT, TRAINER_KIND_HAS_ITEMS,
};
use randomiser_core::{Category, RomImage};

pub const ONE_MEGABYTE: usize = 0x10_0000;
pub const FIXTURE_TITLE: &str = "POKEMON_GLD";

/// Zeroed image with a valid header for `len` bytes.
pub fn blank_image_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    data[LOGO_OFFSET..LOGO_OFFSET + NINTENDO_LOGO.len()].copy_from_slice(&NINTENDO_LOGO);
    data[TITLE_OFFSET..TITLE_OFFSET + FIXTURE_TITLE.len()].copy_from_slice(FIXTURE_TITLE.as_bytes());
    data[0x143] = 0x80;
    data[0x147] = 0x10;
    data[ROM_SIZE_CODE_OFFSET] = (len / MIN_ROM_SIZE).trailing_zeros() as u8;
    data[0x149] = 0x03;
    data[checksum::HEADER_CHECKSUM_OFFSET] = compute_header_checksum(&data);
    let global = compute_global_checksum(&data);
    data[checksum::GLOBAL_CHECKSUM_OFFSET..checksum::GLOBAL_CHECKSUM_OFFSET + 2]
        .copy_from_slice(&global.to_be_bytes());
    data
}

/// Same contents as the unit-test `fixture_image`: every value legal,
/// species 1 -> 2 -> 3 a three-stage chain, party sizes cycling 1..=6.
pub fn fixture_image(len: usize) -> RomImage {
    let mut image = RomImage::from_bytes(blank_image_bytes(len)).expect("valid blank image");
    let items = build_static_item_pool();
    let held = build_held_item_pool();

    for category in Category::ALL {
        for (table_index, table) in schema::descriptors_for(category).iter().enumerate() {
            for (i, slot) in table.slots().into_iter().enumerate() {
                let value: u32 = match table.codec {
                    Codec::Species => ((i * 7 + table_index) as u32 % MAX_SPECIES) + 1,
                    Codec::EvolutionTarget => {
                        let species = slot.entry as u32 + 1;
                        let base = table.entry_base(slot.entry).unwrap();
                        if species < 150 && species % 3 != 0 {
                            image.write_u8(base, 1).unwrap();
                            image.write_u8(base + 1, 16 + (species % 30) as u8).unwrap();
                            species + 1
                        } else {
                            0
                        }
                    }
                    Codec::Item => {
                        image.write_u8(slot.offset + 1, 1).unwrap();
                        items[i % items.len()] as u32
                    }
                    Codec::HeldItem => held[i % held.len()] as u32,
                    Codec::PaletteIndex => i as u32 % PALETTE_COUNT,
                    Codec::FeatureFlag { .. } => 0x20,
                };
                image.write_field(slot.offset, 1, value).unwrap();

                if let Layout::Strided { slot_stride: 2, .. } = table.layout {
                    image.write_u8(slot.offset - 1, 2 + slot.index as u8).unwrap();
                }
            }
        }
    }

    let trainers = &schema::descriptors_for(Category::TrainerRosters)[1];
    for entry in 0..trainers.entry_count() {
        let base = trainers.entry_base(entry).unwrap();
        let size = entry % MAX_PARTY_SIZE + 1;
        let kind = match entry % 4 {
            0 => TRAINER_KIND_HAS_ITEMS,
            1 => TRAINER_KIND_HAS_ITEMS | 1,
            2 => 1,
            _ => 0,
        };
        image.write_u8(base, size as u8).unwrap();
        image.write_u8(base + 1, kind).unwrap();
        for index in 0..MAX_PARTY_SIZE {
            let slot = base + 2 + index * 3;
            image.write_u8(slot, 5 + (entry % 50) as u8).unwrap();
            if index >= size || kind & TRAINER_KIND_HAS_ITEMS == 0 {
                image.write_u8(slot + 2, 0).unwrap();
            }
        }
    }

    checksum::fix_checksums(&mut image).unwrap();
    image
}

pub fn changed_offsets(before: &RomImage, after: &RomImage) -> Vec<usize> {
    before
        .as_bytes()
        .iter()
        .zip(after.as_bytes())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect()
}

pub fn within(offset: usize, ranges: &[Range<usize>]) -> bool {
    ranges.iter().any(|r| r.contains(&offset))
}
