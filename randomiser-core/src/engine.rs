use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{Category, CategorySet};
use crate::evolutions::randomize_evolutions;
use crate::image::{FieldError, RomImage};
use crate::items::{self, ItemRole};
use crate::rng::Randomizer;
use crate::schema::{
    self, Slot, TableDescriptor, MAX_ITEM, MAX_PARTY_SIZE, MAX_SPECIES, PALETTE_COUNT,
    TRAINER_KIND_HAS_ITEMS, TRAINER_PARTY_KIND_OFFSET, TRAINER_PARTY_SIZE_OFFSET,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// Everything one run needs besides the image itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomizationRequest {
    pub seed: u64,
    pub categories: CategorySet,
    /// Redraw budget for every constrained draw.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl RandomizationRequest {
    pub fn new(seed: u64, categories: CategorySet) -> Self {
        Self {
            seed,
            categories,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Error)]
pub enum RandomizationError {
    #[error("could not satisfy the {0} constraints")]
    ConstraintUnsatisfiable(Category),
    #[error("{category} table access failed: {source}")]
    Field {
        category: Category,
        #[source]
        source: FieldError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChange {
    pub table: String,
    pub offset: usize,
    pub old: u32,
    pub new: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLog {
    pub category: Category,
    pub changes: Vec<SlotChange>,
}

/// What a successful run changed, slot by slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoilerLog {
    pub seed: u64,
    pub categories: Vec<CategoryLog>,
}

impl SpoilerLog {
    pub fn changes_for(&self, category: Category) -> Option<&[SlotChange]> {
        self.categories
            .iter()
            .find(|log| log.category == category)
            .map(|log| log.changes.as_slice())
    }
}

pub(crate) struct SlotEdit {
    pub slot: Slot,
    pub old: u32,
    pub new: u32,
}

/// New values for some slots of one table, not yet written.
pub(crate) struct TableEdit {
    pub table: &'static TableDescriptor,
    pub slots: Vec<SlotEdit>,
}

impl TableEdit {
    pub fn new(table: &'static TableDescriptor) -> Self {
        Self {
            table,
            slots: Vec::new(),
        }
    }

    pub fn push(&mut self, slot: Slot, old: u32, new: u32) {
        self.slots.push(SlotEdit { slot, old, new });
    }
}

/// Read-only view a pass works from; edits are applied by the engine only
/// after the whole category validated.
pub(crate) struct PassContext<'a> {
    pub image: &'a RomImage,
    pub rng: Randomizer,
    pub category: Category,
    pub max_attempts: u32,
}

impl PassContext<'_> {
    pub fn read_u8(&self, offset: usize) -> Result<u8, RandomizationError> {
        self.image
            .read_u8(offset)
            .map_err(|source| RandomizationError::Field {
                category: self.category,
                source,
            })
    }

    pub fn read_slots(&self, table: &TableDescriptor) -> Result<Vec<(Slot, u32)>, RandomizationError> {
        let width = table.codec.width();
        table
            .slots()
            .into_iter()
            .map(|slot| {
                self.image
                    .read_field(slot.offset, width)
                    .map(|value| (slot, value))
                    .map_err(|source| RandomizationError::Field {
                        category: self.category,
                        source,
                    })
            })
            .collect()
    }

    pub fn draw<F>(&mut self, candidates: &[u32], accept: F) -> Result<u32, RandomizationError>
    where
        F: Fn(&u32) -> bool,
    {
        self.rng
            .pick_with_constraint(candidates, accept, self.max_attempts)
            .map_err(|e| {
                debug!("{}: {}", self.category, e);
                RandomizationError::ConstraintUnsatisfiable(self.category)
            })
    }
}

type Pass = fn(&mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError>;

fn pass_for(category: Category) -> Pass {
    match category {
        Category::Evolutions => randomize_evolutions,
        Category::IntroStarter | Category::PlayerStarter => randomize_linked_species,
        Category::WildEncounters
        | Category::GiftPlacements
        | Category::StaticPlacements
        | Category::GameCornerPlacements => randomize_species_slots,
        Category::TrainerRosters => randomize_trainer_rosters,
        Category::StaticItems => randomize_static_items,
        Category::ShinyFlag => enable_shiny_mode,
        Category::ColorPalettes => randomize_palettes,
    }
}

pub(crate) fn species_pool() -> Vec<u32> {
    (1..=MAX_SPECIES).collect()
}

/// One draw per entry, written to the same entry of every table in the
/// category (a starter's pic and its givepoke must agree).
fn randomize_linked_species(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let tables = schema::descriptors_for(ctx.category);
    let entries = tables.iter().map(|t| t.entry_count()).max().unwrap_or(0);
    let pool = species_pool();

    let mut drawn = Vec::with_capacity(entries);
    for _ in 0..entries {
        drawn.push(ctx.draw(&pool, |_| true)?);
    }

    let mut edits = Vec::with_capacity(tables.len());
    for table in tables {
        let mut edit = TableEdit::new(table);
        for (slot, old) in ctx.read_slots(table)? {
            edit.push(slot, old, drawn[slot.entry]);
        }
        edits.push(edit);
    }
    Ok(edits)
}

fn randomize_species_slots(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let pool = species_pool();
    let mut edits = Vec::new();
    for table in schema::descriptors_for(ctx.category) {
        let mut edit = TableEdit::new(table);
        for (slot, old) in ctx.read_slots(table)? {
            let new = ctx.draw(&pool, |_| true)?;
            edit.push(slot, old, new);
        }
        edits.push(edit);
    }
    Ok(edits)
}

/// Species of every occupied party slot are redrawn; held items too when
/// the party kind carries them. Party size, kind and levels are kept.
fn randomize_trainer_rosters(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let tables = schema::descriptors_for(Category::TrainerRosters);
    let (species_table, item_table) = (&tables[0], &tables[1]);

    let mut parties = Vec::with_capacity(species_table.entry_count());
    for entry in 0..species_table.entry_count() {
        let base = species_table
            .entry_base(entry)
            .ok_or(RandomizationError::ConstraintUnsatisfiable(ctx.category))?;
        let size = ctx.read_u8(base + TRAINER_PARTY_SIZE_OFFSET)? as usize;
        let kind = ctx.read_u8(base + TRAINER_PARTY_KIND_OFFSET)?;
        if size == 0 || size > MAX_PARTY_SIZE {
            warn!("trainer party {} at 0x{:06X} has size {}", entry, base, size);
            return Err(RandomizationError::ConstraintUnsatisfiable(ctx.category));
        }
        parties.push((size, kind));
    }

    let species = species_pool();
    let mut species_edit = TableEdit::new(species_table);
    for (slot, old) in ctx.read_slots(species_table)? {
        let (size, _) = parties[slot.entry];
        if slot.index < size {
            let new = ctx.draw(&species, |_| true)?;
            species_edit.push(slot, old, new);
        }
    }

    let held: Vec<u32> = items::build_held_item_pool()
        .into_iter()
        .map(u32::from)
        .collect();
    let mut item_edit = TableEdit::new(item_table);
    for (slot, old) in ctx.read_slots(item_table)? {
        let (size, kind) = parties[slot.entry];
        if slot.index < size && kind & TRAINER_KIND_HAS_ITEMS != 0 {
            let new = ctx.draw(&held, |_| true)?;
            item_edit.push(slot, old, new);
        }
    }

    Ok(vec![species_edit, item_edit])
}

/// Item balls are redrawn over the whole item range with reserved ids
/// rejected. Balls that hold a quest item keep it.
fn randomize_static_items(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let candidates: Vec<u32> = (1..=MAX_ITEM).collect();
    let mut edits = Vec::new();
    for table in schema::descriptors_for(Category::StaticItems) {
        let mut edit = TableEdit::new(table);
        for (slot, old) in ctx.read_slots(table)? {
            if let Some(item) = items::reserved_item(old as u8) {
                if item.role != ItemRole::Unused {
                    debug!("keeping {} in item ball at 0x{:06X}", item.name, slot.offset);
                    continue;
                }
            }
            let new = ctx.draw(&candidates, |&id| {
                items::is_static_item_allowed(id as u8)
            })?;
            edit.push(slot, old, new);
        }
        edits.push(edit);
    }
    Ok(edits)
}

fn enable_shiny_mode(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let mut edits = Vec::new();
    for table in schema::descriptors_for(Category::ShinyFlag) {
        let mask = match table.codec {
            schema::Codec::FeatureFlag { mask } => mask as u32,
            _ => continue,
        };
        let mut edit = TableEdit::new(table);
        for (slot, old) in ctx.read_slots(table)? {
            edit.push(slot, old, old | mask);
        }
        edits.push(edit);
    }
    Ok(edits)
}

fn randomize_palettes(ctx: &mut PassContext<'_>) -> Result<Vec<TableEdit>, RandomizationError> {
    let pool: Vec<u32> = (0..PALETTE_COUNT).collect();
    let mut edits = Vec::new();
    for table in schema::descriptors_for(Category::ColorPalettes) {
        let mut edit = TableEdit::new(table);
        for (slot, old) in ctx.read_slots(table)? {
            let new = ctx.draw(&pool, |_| true)?;
            edit.push(slot, old, new);
        }
        edits.push(edit);
    }
    Ok(edits)
}

/// Validates every edit of a category, then writes them all.
fn commit(
    image: &mut RomImage,
    category: Category,
    edits: &[TableEdit],
) -> Result<Vec<SlotChange>, RandomizationError> {
    for edit in edits {
        for s in &edit.slots {
            if !edit.table.codec.accepts(s.new, s.slot.entry) {
                warn!(
                    "{}: value 0x{:X} rejected for {} at 0x{:06X}",
                    category, s.new, edit.table.name, s.slot.offset
                );
                return Err(RandomizationError::ConstraintUnsatisfiable(category));
            }
        }
    }

    let mut changes = Vec::new();
    for edit in edits {
        let width = edit.table.codec.width();
        for s in &edit.slots {
            image
                .write_field(s.slot.offset, width, s.new)
                .map_err(|source| RandomizationError::Field { category, source })?;
            if s.old != s.new {
                changes.push(SlotChange {
                    table: edit.table.name.to_string(),
                    offset: s.slot.offset,
                    old: s.old,
                    new: s.new,
                });
            }
        }
        debug!("{}: wrote {} slots of {}", category, edit.slots.len(), edit.table.name);
    }
    Ok(changes)
}

pub struct Engine {
    request: RandomizationRequest,
}

impl Engine {
    pub fn new(request: RandomizationRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &RandomizationRequest {
        &self.request
    }

    /// Runs every enabled pass in canonical order. On error the passes that
    /// already finished stay applied to `image`; nothing after the failing
    /// category is touched.
    pub fn run(&self, image: &mut RomImage) -> Result<SpoilerLog, RandomizationError> {
        let request = &self.request;
        info!(
            "randomising with seed {} ({} categories)",
            request.seed,
            request.categories.len()
        );

        let mut log = SpoilerLog {
            seed: request.seed,
            categories: Vec::new(),
        };

        for category in request.categories.iter() {
            let mut ctx = PassContext {
                image: &*image,
                rng: Randomizer::for_category(request.seed, category),
                category,
                max_attempts: request.max_attempts,
            };
            let edits = pass_for(category)(&mut ctx)?;
            let changes = commit(image, category, &edits)?;
            info!("{}: {} slots changed", category, changes.len());
            log.categories.push(CategoryLog { category, changes });
        }

        Ok(log)
    }
}
