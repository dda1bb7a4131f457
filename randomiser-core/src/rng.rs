use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no acceptable candidate after {attempts} attempts")]
pub struct ConstraintExhausted {
    pub attempts: u32,
}

/// Deterministic draw source. Everything a pass randomises comes from one
/// of these, so a seed fully determines the output image.
pub struct Randomizer {
    rng: StdRng,
}

impl Randomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Independent stream for one category, so enabling another category
    /// never changes what this one draws.
    pub fn for_category(seed: u64, category: Category) -> Self {
        Self::new(seed ^ category.seed_salt())
    }

    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    pub fn draw_in_range(&mut self, range: RangeInclusive<u32>) -> u32 {
        self.rng.gen_range(range)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    pub fn pick_one<'a, T>(&mut self, candidates: &'a [T]) -> Option<&'a T> {
        candidates.choose(&mut self.rng)
    }

    /// Uniform draws from `candidates` until one satisfies `accept`, giving
    /// up after `max_attempts` draws.
    pub fn pick_with_constraint<T, F>(
        &mut self,
        candidates: &[T],
        accept: F,
        max_attempts: u32,
    ) -> Result<T, ConstraintExhausted>
    where
        T: Copy,
        F: Fn(&T) -> bool,
    {
        for _ in 0..max_attempts {
            match self.pick_one(candidates) {
                Some(candidate) if accept(candidate) => return Ok(*candidate),
                Some(_) => continue,
                None => break,
            }
        }
        Err(ConstraintExhausted {
            attempts: max_attempts,
        })
    }
}
