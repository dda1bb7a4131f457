use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One randomisation toggle.
///
/// Variants are declared in execution order, so iterating a
/// [`CategorySet`] always visits evolutions first and the purely cosmetic
/// passes last.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Evolutions,
    IntroStarter,
    PlayerStarter,
    WildEncounters,
    TrainerRosters,
    GiftPlacements,
    StaticPlacements,
    GameCornerPlacements,
    StaticItems,
    ShinyFlag,
    ColorPalettes,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Evolutions,
        Category::IntroStarter,
        Category::PlayerStarter,
        Category::WildEncounters,
        Category::TrainerRosters,
        Category::GiftPlacements,
        Category::StaticPlacements,
        Category::GameCornerPlacements,
        Category::StaticItems,
        Category::ShinyFlag,
        Category::ColorPalettes,
    ];

    /// Order of the toggles as the menu presents them.
    pub const MENU_ORDER: [Category; 11] = [
        Category::IntroStarter,
        Category::PlayerStarter,
        Category::Evolutions,
        Category::WildEncounters,
        Category::TrainerRosters,
        Category::GiftPlacements,
        Category::StaticPlacements,
        Category::GameCornerPlacements,
        Category::StaticItems,
        Category::ShinyFlag,
        Category::ColorPalettes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Evolutions => "evolutions",
            Category::IntroStarter => "intro-starter",
            Category::PlayerStarter => "player-starter",
            Category::WildEncounters => "wild-encounters",
            Category::TrainerRosters => "trainer-rosters",
            Category::GiftPlacements => "gift-placements",
            Category::StaticPlacements => "static-placements",
            Category::GameCornerPlacements => "game-corner-placements",
            Category::StaticItems => "static-items",
            Category::ShinyFlag => "shiny-flag",
            Category::ColorPalettes => "color-palettes",
        }
    }

    pub fn menu_label(self) -> &'static str {
        match self {
            Category::IntroStarter => "Randomize intro pokemon",
            Category::PlayerStarter => "Randomize starter pokemon",
            Category::Evolutions => "Randomize evolutions",
            Category::WildEncounters => "Randomize wild pokemon",
            Category::TrainerRosters => "Randomize trainers",
            Category::GiftPlacements => "Randomize gift pokemon",
            Category::StaticPlacements => "Randomize static pokemon",
            Category::GameCornerPlacements => "Randomize game corner pokemon",
            Category::StaticItems => "Randomize static items",
            Category::ShinyFlag => "Enable shiny mode",
            Category::ColorPalettes => "Randomize pokemon colour palettes",
        }
    }

    /// Salt mixed into the run seed so every pass draws from its own stream.
    pub(crate) fn seed_salt(self) -> u64 {
        match self {
            Category::Evolutions => 0xE701_0C4A_u64,
            Category::IntroStarter => 0x1A7D_0001_u64,
            Category::PlayerStarter => 0x57A7_7E25_u64,
            Category::WildEncounters => 0x3C1D_F00D_u64,
            Category::TrainerRosters => 0x7A1E_2B0B_u64,
            Category::GiftPlacements => 0x61F7_0E66_u64,
            Category::StaticPlacements => 0x57A7_1C00_u64,
            Category::GameCornerPlacements => 0xC0A1_2C0E_u64,
            Category::StaticItems => 0x17E3_BA11_u64,
            Category::ShinyFlag => 0x5A1E_5A1E_u64,
            Category::ColorPalettes => 0xC010_5EED_u64,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown randomisation category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Enabled categories. Duplicates collapse and iteration follows the
/// execution order regardless of insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Category::ALL.into_iter().collect()
    }

    /// Builds the set from the eleven menu toggles in [`Category::MENU_ORDER`].
    pub fn from_menu_flags(flags: [bool; 11]) -> Self {
        Category::MENU_ORDER
            .into_iter()
            .zip(flags)
            .filter_map(|(category, enabled)| enabled.then_some(category))
            .collect()
    }

    pub fn insert(&mut self, category: Category) -> bool {
        self.0.insert(category)
    }

    pub fn remove(&mut self, category: Category) -> bool {
        self.0.remove(&category)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
