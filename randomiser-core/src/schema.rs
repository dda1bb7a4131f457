//! Where every randomised table lives in the image.
//!
//! This is a fixed schema of flat, fixed-stride records at pre-known file
//! offsets. It is not the retail Gold layout: there, trainer parties are
//! terminated variable-length records and 0x427BD is a pointer table, so
//! running the TrainerRosters or Evolutions passes over a retail dump would
//! overwrite pointers and script bytes. Images must be built to this layout.
//! Nothing here is discovered at runtime; `descriptors_for` is the only
//! entry point the passes use to find their data.

use std::ops::Range;

use crate::category::Category;
use crate::checksum::{GLOBAL_CHECKSUM_OFFSET, HEADER_CHECKSUM_OFFSET};
use crate::image::HEADER_END;
use crate::items;

pub const MAX_SPECIES: u32 = 251;
pub const MAX_ITEM: u32 = 0xF9;
pub const PALETTE_COUNT: u32 = 0x24;
pub const MAX_PARTY_SIZE: usize = 6;

/// Trainer party record: `[party_size, party_kind, (level, species, item) x 6]`.
pub const TRAINER_PARTY_SIZE_OFFSET: usize = 0;
pub const TRAINER_PARTY_KIND_OFFSET: usize = 1;
pub const TRAINER_KIND_HAS_ITEMS: u8 = 0x02;
pub const TRAINER_RECORD_STRIDE: usize = 20;

/// Evolution record per species: `[method, param, target, 0]`. Method 0 = none.
pub const EVOLUTION_METHOD_OFFSET: usize = 0;
pub const EVOLUTION_RECORD_STRIDE: usize = 4;

pub const SHINY_ENABLE_MASK: u8 = 0x01;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Codec {
    Species,
    /// Species id stored in the evolution record of species `entry + 1`.
    EvolutionTarget,
    Item,
    /// Trainer held item; 0 means "no item".
    HeldItem,
    PaletteIndex,
    FeatureFlag { mask: u8 },
}

impl Codec {
    pub fn width(self) -> usize {
        1
    }

    /// Legality predicate for a value written into slot `entry` of a table.
    pub fn accepts(self, value: u32, entry: usize) -> bool {
        match self {
            Codec::Species => is_valid_species(value),
            Codec::EvolutionTarget => is_valid_species(value) && value != entry as u32 + 1,
            Codec::Item => value <= 0xFF && items::is_static_item_allowed(value as u8),
            Codec::HeldItem => value == 0 || (value <= 0xFF && items::is_held_item_allowed(value as u8)),
            Codec::PaletteIndex => value < PALETTE_COUNT,
            Codec::FeatureFlag { mask } => value <= 0xFF && value as u8 & mask == mask,
        }
    }
}

pub fn is_valid_species(id: u32) -> bool {
    (1..=MAX_SPECIES).contains(&id)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Layout {
    /// `entry_count` records of `entry_stride` bytes; each record holds
    /// `slots_per_entry` values starting `slot_offset` bytes in, spaced by
    /// `slot_stride`.
    Strided {
        base: usize,
        entry_count: usize,
        entry_stride: usize,
        slot_offset: usize,
        slots_per_entry: usize,
        slot_stride: usize,
    },
    /// Single values embedded in map scripts at fixed offsets.
    Scattered(&'static [usize]),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Slot {
    pub entry: usize,
    pub index: usize,
    pub offset: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub category: Category,
    pub layout: Layout,
    pub codec: Codec,
}

impl TableDescriptor {
    pub fn entry_count(&self) -> usize {
        match self.layout {
            Layout::Strided { entry_count, .. } => entry_count,
            Layout::Scattered(offsets) => offsets.len(),
        }
    }

    /// File offset of record `entry`, for strided tables.
    pub fn entry_base(&self, entry: usize) -> Option<usize> {
        match self.layout {
            Layout::Strided {
                base,
                entry_count,
                entry_stride,
                ..
            } if entry < entry_count => Some(base + entry * entry_stride),
            _ => None,
        }
    }

    pub fn slots(&self) -> Vec<Slot> {
        match self.layout {
            Layout::Strided {
                base,
                entry_count,
                entry_stride,
                slot_offset,
                slots_per_entry,
                slot_stride,
            } => (0..entry_count)
                .flat_map(|entry| {
                    (0..slots_per_entry).map(move |index| Slot {
                        entry,
                        index,
                        offset: base + entry * entry_stride + slot_offset + index * slot_stride,
                    })
                })
                .collect(),
            Layout::Scattered(offsets) => offsets
                .iter()
                .enumerate()
                .map(|(entry, &offset)| Slot {
                    entry,
                    index: 0,
                    offset,
                })
                .collect(),
        }
    }

    /// Whole byte span the table is declared over.
    pub fn extent(&self) -> Range<usize> {
        match self.layout {
            Layout::Strided {
                base,
                entry_count,
                entry_stride,
                ..
            } => base..base + entry_count * entry_stride,
            Layout::Scattered(offsets) => {
                let start = offsets.iter().copied().min().unwrap_or(0);
                let end = offsets
                    .iter()
                    .map(|&o| o + self.codec.width())
                    .max()
                    .unwrap_or(0);
                start..end
            }
        }
    }

    /// Exact bytes the table's slots occupy.
    pub fn footprint(&self) -> Vec<Range<usize>> {
        let width = self.codec.width();
        self.slots()
            .into_iter()
            .map(|slot| slot.offset..slot.offset + width)
            .collect()
    }
}

const fn strided(
    name: &'static str,
    category: Category,
    base: usize,
    entry_count: usize,
    entry_stride: usize,
    slot_offset: usize,
    slots_per_entry: usize,
    slot_stride: usize,
    codec: Codec,
) -> TableDescriptor {
    TableDescriptor {
        name,
        category,
        layout: Layout::Strided {
            base,
            entry_count,
            entry_stride,
            slot_offset,
            slots_per_entry,
            slot_stride,
        },
        codec,
    }
}

const fn scattered(
    name: &'static str,
    category: Category,
    offsets: &'static [usize],
    codec: Codec,
) -> TableDescriptor {
    TableDescriptor {
        name,
        category,
        layout: Layout::Scattered(offsets),
        codec,
    }
}

// Wild data: grass areas are `[map_group, map_id, rate_morn, rate_day,
// rate_nite, (level, species) x 21]`, water areas `[map_group, map_id, rate,
// (level, species) x 3]`.
const WILD_GRASS_STRIDE: usize = 47;
const WILD_WATER_STRIDE: usize = 9;

static EVOLUTIONS: [TableDescriptor; 1] = [strided(
    "evolution_targets",
    Category::Evolutions,
    0x427BD,
    MAX_SPECIES as usize,
    EVOLUTION_RECORD_STRIDE,
    2,
    1,
    0,
    Codec::EvolutionTarget,
)];

// The intro shows one species twice: its front pic and its cry.
static INTRO: [TableDescriptor; 2] = [
    scattered("intro_pic", Category::IntroStarter, &[0x54A3F], Codec::Species),
    scattered("intro_cry", Category::IntroStarter, &[0x54A52], Codec::Species),
];

// Elm's lab: the preview pic shown before choosing, then the givepoke.
static STARTERS: [TableDescriptor; 2] = [
    scattered(
        "starter_givepoke",
        Category::PlayerStarter,
        &[0x78C5A, 0x78C9D, 0x78CE0],
        Codec::Species,
    ),
    scattered(
        "starter_preview_pic",
        Category::PlayerStarter,
        &[0x78C3F, 0x78C82, 0x78CC5],
        Codec::Species,
    ),
];

static WILD: [TableDescriptor; 3] = [
    strided(
        "wild_johto_grass",
        Category::WildEncounters,
        0x2A5E9,
        61,
        WILD_GRASS_STRIDE,
        6,
        21,
        2,
        Codec::Species,
    ),
    strided(
        "wild_kanto_grass",
        Category::WildEncounters,
        0x2B7C0,
        41,
        WILD_GRASS_STRIDE,
        6,
        21,
        2,
        Codec::Species,
    ),
    strided(
        "wild_water",
        Category::WildEncounters,
        0x2BF50,
        45,
        WILD_WATER_STRIDE,
        4,
        3,
        2,
        Codec::Species,
    ),
];

pub const TRAINER_PARTIES_BASE: usize = 0x39A2A;
pub const TRAINER_PARTY_COUNT: usize = 420;

static TRAINERS: [TableDescriptor; 2] = [
    strided(
        "trainer_species",
        Category::TrainerRosters,
        TRAINER_PARTIES_BASE,
        TRAINER_PARTY_COUNT,
        TRAINER_RECORD_STRIDE,
        3,
        MAX_PARTY_SIZE,
        3,
        Codec::Species,
    ),
    strided(
        "trainer_held_items",
        Category::TrainerRosters,
        TRAINER_PARTIES_BASE,
        TRAINER_PARTY_COUNT,
        TRAINER_RECORD_STRIDE,
        4,
        MAX_PARTY_SIZE,
        3,
        Codec::HeldItem,
    ),
];

static GIFTS: [TableDescriptor; 1] = [scattered(
    "gift_givepoke",
    Category::GiftPlacements,
    &[
        0x15C3E, 0x4E1A3, 0x6A3F2, 0x72E7B, 0x76D05, 0x7C88A, 0x9A4B1, 0xA1E36,
    ],
    Codec::Species,
)];

static STATICS: [TableDescriptor; 1] = [scattered(
    "static_loadwildmon",
    Category::StaticPlacements,
    &[
        0x5A6D0, 0x5C0F4, 0x61B2E, 0x6E7D1, 0x70A3C, 0x71F58, 0x7D2C4, 0x8B5A7, 0x94E10, 0x9C3D2,
        0xAE702,
    ],
    Codec::Species,
)];

// Prize menus: `[species, level, price_lo, price_hi]`.
static GAME_CORNER: [TableDescriptor; 2] = [
    strided(
        "goldenrod_prizes",
        Category::GameCornerPlacements,
        0x7A3C0,
        3,
        4,
        0,
        1,
        0,
        Codec::Species,
    ),
    strided(
        "celadon_prizes",
        Category::GameCornerPlacements,
        0x7A3E0,
        3,
        4,
        0,
        1,
        0,
        Codec::Species,
    ),
];

// Overworld item balls: `[item, quantity]`.
static STATIC_ITEMS: [TableDescriptor; 1] = [strided(
    "item_balls",
    Category::StaticItems,
    0xB4000,
    128,
    2,
    0,
    1,
    0,
    Codec::Item,
)];

// Operand of the DV comparison in the shiny check; bit 0 makes it pass
// unconditionally.
static SHINY: [TableDescriptor; 1] = [scattered(
    "shiny_check",
    Category::ShinyFlag,
    &[0x3E5A],
    Codec::FeatureFlag {
        mask: SHINY_ENABLE_MASK,
    },
)];

static PALETTES: [TableDescriptor; 1] = [strided(
    "species_palettes",
    Category::ColorPalettes,
    0xAD45,
    MAX_SPECIES as usize,
    1,
    0,
    1,
    0,
    Codec::PaletteIndex,
)];

pub fn descriptors_for(category: Category) -> &'static [TableDescriptor] {
    match category {
        Category::Evolutions => &EVOLUTIONS,
        Category::IntroStarter => &INTRO,
        Category::PlayerStarter => &STARTERS,
        Category::WildEncounters => &WILD,
        Category::TrainerRosters => &TRAINERS,
        Category::GiftPlacements => &GIFTS,
        Category::StaticPlacements => &STATICS,
        Category::GameCornerPlacements => &GAME_CORNER,
        Category::StaticItems => &STATIC_ITEMS,
        Category::ShinyFlag => &SHINY,
        Category::ColorPalettes => &PALETTES,
    }
}

pub fn all_descriptors() -> impl Iterator<Item = &'static TableDescriptor> {
    Category::ALL
        .into_iter()
        .flat_map(|category| descriptors_for(category).iter())
}

/// Smallest image that holds every table.
pub fn required_len() -> usize {
    all_descriptors()
        .map(|d| d.extent().end)
        .max()
        .unwrap_or(HEADER_END)
}

/// Offsets a run with only `category` enabled may change: the category's
/// slots plus the header checksum bytes every save rewrites.
pub fn writable_ranges(category: Category) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = descriptors_for(category)
        .iter()
        .flat_map(|d| d.footprint())
        .collect();
    ranges.push(HEADER_CHECKSUM_OFFSET..GLOBAL_CHECKSUM_OFFSET + 2);
    ranges
}
