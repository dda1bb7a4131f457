use crate::schema::MAX_ITEM;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ItemRole {
    /// Required to progress; placing it in a random ball can soft-lock.
    KeyProgression,
    /// Quest item whose script checks for the exact id.
    KeyQuest,
    HiddenMachine,
    /// Dummy "TERU-SAMA" slots left in the item table.
    Unused,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct ReservedItem {
    pub id: u8,
    pub name: &'static str,
    pub role: ItemRole,
}

pub(crate) const RESERVED_ITEMS: &[ReservedItem] = &[
    ReservedItem {
        id: 0x07,
        name: "Bicycle",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x19,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x2D,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x32,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x36,
        name: "Coin Case",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x37,
        name: "Itemfinder",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x38,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x3A,
        name: "Old Rod",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x3B,
        name: "Good Rod",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x3D,
        name: "Super Rod",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x42,
        name: "Red Scale",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x43,
        name: "SecretPotion",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x44,
        name: "S.S. Ticket",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x45,
        name: "Mystery Egg",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x47,
        name: "Silver Wing",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x5A,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x64,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x73,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x7F,
        name: "Card Key",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x80,
        name: "Machine Part",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x82,
        name: "Lost Item",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0x85,
        name: "Basement Key",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x86,
        name: "Pass",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0x87,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x88,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x89,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x8D,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x8E,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x91,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x93,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x99,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x9A,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0x9B,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xA2,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xAB,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xAF,
        name: "SquirtBottle",
        role: ItemRole::KeyProgression,
    },
    ReservedItem {
        id: 0xB0,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xB2,
        name: "Rainbow Wing",
        role: ItemRole::KeyQuest,
    },
    ReservedItem {
        id: 0xB3,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xBE,
        name: "TERU-SAMA",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xC3,
        name: "TM04 (unused)",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xDC,
        name: "TM28 (unused)",
        role: ItemRole::Unused,
    },
    ReservedItem {
        id: 0xF3,
        name: "HM01 Cut",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF4,
        name: "HM02 Fly",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF5,
        name: "HM03 Surf",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF6,
        name: "HM04 Strength",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF7,
        name: "HM05 Flash",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF8,
        name: "HM06 Whirlpool",
        role: ItemRole::HiddenMachine,
    },
    ReservedItem {
        id: 0xF9,
        name: "HM07 Waterfall",
        role: ItemRole::HiddenMachine,
    },
];

/// First and last TM ids; trainers never hold these.
const TM_FIRST: u8 = 0xBF;
const TM_LAST: u8 = 0xF2;

pub(crate) fn reserved_item(id: u8) -> Option<&'static ReservedItem> {
    RESERVED_ITEMS.iter().find(|item| item.id == id)
}

pub fn is_static_item_allowed(id: u8) -> bool {
    id != 0 && id as u32 <= MAX_ITEM && reserved_item(id).is_none()
}

pub fn is_held_item_allowed(id: u8) -> bool {
    is_static_item_allowed(id) && !(TM_FIRST..=TM_LAST).contains(&id)
}

/// Every id an overworld item ball may be rewritten to.
pub fn build_static_item_pool() -> Vec<u8> {
    (1..=MAX_ITEM as u8)
        .filter(|&id| is_static_item_allowed(id))
        .collect()
}

pub fn build_held_item_pool() -> Vec<u8> {
    (1..=MAX_ITEM as u8)
        .filter(|&id| is_held_item_allowed(id))
        .collect()
}
