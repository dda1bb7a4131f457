//! Evolution target rewiring.
//!
//! Chains are taken from the vanilla table (Cyndaquil -> Quilava ->
//! Typhlosion). Each evolving node gets a fresh target that is neither a
//! member of its own chain nor a target already handed to a shallower node
//! of that chain. Targets are also checked against the rewritten graph built
//! so far: a candidate whose new evolution path leads back to the node is
//! rejected, so the output table never contains a loop.

use std::collections::BTreeSet;

use crate::category::Category;
use crate::engine::{species_pool, PassContext, RandomizationError, TableEdit};
use crate::schema::{self, is_valid_species, EVOLUTION_METHOD_OFFSET};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Chain {
    /// Species that evolve, root first.
    pub nodes: Vec<u32>,
    /// Every species on the chain, including the final form.
    pub members: Vec<u32>,
}

/// `targets[i]` is the evolution target of species `i + 1`, or `None` if it
/// does not evolve.
pub(crate) fn evolution_chains(targets: &[Option<u32>]) -> Vec<Chain> {
    let evolves = |species: u32| -> Option<u32> {
        targets
            .get(species.checked_sub(1)? as usize)
            .copied()
            .flatten()
    };

    let targeted: BTreeSet<u32> = targets.iter().flatten().copied().collect();
    let evolving: Vec<u32> = (1..=targets.len() as u32)
        .filter(|&s| evolves(s).is_some())
        .collect();

    // Roots first; whatever is left unvisited afterwards sits on a cycle.
    let mut starts: Vec<u32> = evolving
        .iter()
        .copied()
        .filter(|s| !targeted.contains(s))
        .collect();
    starts.extend(evolving.iter().copied().filter(|s| targeted.contains(s)));

    let mut visited = BTreeSet::new();
    let mut chains = Vec::new();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut chain = Chain::default();
        let mut current = start;
        loop {
            if chain.members.contains(&current) {
                break;
            }
            chain.members.push(current);
            let next = match evolves(current) {
                Some(next) if !visited.contains(&current) => next,
                _ => break,
            };
            visited.insert(current);
            chain.nodes.push(current);
            if !is_valid_species(next) {
                break;
            }
            current = next;
        }
        if !chain.nodes.is_empty() {
            chains.push(chain);
        }
    }
    chains
}

/// True when following `assigned` from `start` reaches `species`.
fn leads_to(assigned: &[Option<u32>], start: u32, species: u32) -> bool {
    let mut current = start;
    // Every edge in `assigned` passed this check, so the walk is acyclic;
    // the step bound only guards against a malformed map.
    for _ in 0..=assigned.len() {
        if current == species {
            return true;
        }
        match current
            .checked_sub(1)
            .and_then(|i| assigned.get(i as usize))
            .copied()
            .flatten()
        {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

pub(crate) fn randomize_evolutions(
    ctx: &mut PassContext<'_>,
) -> Result<Vec<TableEdit>, RandomizationError> {
    let table = &schema::descriptors_for(Category::Evolutions)[0];
    let slots = ctx.read_slots(table)?;

    let mut targets = Vec::with_capacity(slots.len());
    for (slot, target) in &slots {
        let base = table
            .entry_base(slot.entry)
            .ok_or(RandomizationError::ConstraintUnsatisfiable(ctx.category))?;
        let method = ctx.read_u8(base + EVOLUTION_METHOD_OFFSET)?;
        targets.push((method != 0).then_some(*target));
    }

    let pool = species_pool();
    let mut assigned: Vec<Option<u32>> = vec![None; targets.len()];
    let mut edit = TableEdit::new(table);
    for chain in evolution_chains(&targets) {
        let mut excluded: BTreeSet<u32> = chain.members.iter().copied().collect();
        for &species in &chain.nodes {
            let new = ctx.draw(&pool, |&candidate| {
                candidate != species
                    && !excluded.contains(&candidate)
                    && !leads_to(&assigned, candidate, species)
            })?;
            excluded.insert(new);
            assigned[species as usize - 1] = Some(new);
            let (slot, old) = slots[species as usize - 1];
            edit.push(slot, old, new);
        }
    }
    Ok(vec![edit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, RandomizationRequest};
    use crate::test_support::fixture_image;

    fn table(len: usize, links: &[(u32, u32)]) -> Vec<Option<u32>> {
        let mut targets = vec![None; len];
        for &(from, to) in links {
            targets[from as usize - 1] = Some(to);
        }
        targets
    }

    #[test]
    fn walks_chains_from_roots() {
        let targets = table(20, &[(1, 2), (2, 3), (10, 11), (12, 13)]);
        let chains = evolution_chains(&targets);
        assert_eq!(
            chains,
            vec![
                Chain {
                    nodes: vec![1, 2],
                    members: vec![1, 2, 3]
                },
                Chain {
                    nodes: vec![10],
                    members: vec![10, 11]
                },
                Chain {
                    nodes: vec![12],
                    members: vec![12, 13]
                },
            ]
        );
    }

    #[test]
    fn cycles_are_visited_once() {
        let targets = table(5, &[(2, 3), (3, 2)]);
        let chains = evolution_chains(&targets);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].nodes, vec![2, 3]);
    }

    #[test]
    fn invalid_target_ends_chain() {
        let targets = table(5, &[(1, 0)]);
        let chains = evolution_chains(&targets);
        assert_eq!(chains[0].nodes, vec![1]);
        assert_eq!(chains[0].members, vec![1]);
    }

    #[test]
    fn three_node_chain_never_repeats() {
        for seed in 0..32 {
            let mut image = fixture_image(0x10_0000);
            let request =
                RandomizationRequest::new(seed, [Category::Evolutions].into_iter().collect());
            Engine::new(request).run(&mut image).unwrap();

            let table = &schema::descriptors_for(Category::Evolutions)[0];
            let target_of = |species: u32| {
                image
                    .read_u8(table.slots()[species as usize - 1].offset)
                    .unwrap() as u32
            };

            // The fixture wires 1 -> 2 -> 3.
            let chain = [1u32, 2, 3];
            let first = target_of(1);
            let second = target_of(2);
            assert_ne!(first, second, "seed {seed}");
            for t in [first, second] {
                assert!(!chain.contains(&t), "seed {seed}: {t} points back into chain");
                assert!(is_valid_species(t));
            }
        }
    }

    #[test]
    fn rewritten_graph_has_no_loops() {
        let table = &schema::descriptors_for(Category::Evolutions)[0];
        for seed in 0..64 {
            let mut image = fixture_image(0x10_0000);
            let request =
                RandomizationRequest::new(seed, [Category::Evolutions].into_iter().collect());
            Engine::new(request).run(&mut image).unwrap();

            let mut next: Vec<Option<u32>> = Vec::with_capacity(table.entry_count());
            for slot in table.slots() {
                let base = table.entry_base(slot.entry).unwrap();
                let method = image.read_u8(base + EVOLUTION_METHOD_OFFSET).unwrap();
                let target = image.read_u8(slot.offset).unwrap() as u32;
                next.push((method != 0).then_some(target));
            }

            for start in 1..=next.len() as u32 {
                let mut seen = BTreeSet::new();
                let mut current = start;
                while let Some(target) = next[current as usize - 1] {
                    assert!(seen.insert(current), "seed {seed}: loop through {current}");
                    current = target;
                }
            }
        }
    }

    #[test]
    fn walk_stops_at_unassigned_nodes() {
        let mut assigned = vec![None; 6];
        assigned[0] = Some(2);
        assigned[1] = Some(3);
        assert!(leads_to(&assigned, 1, 3));
        assert!(leads_to(&assigned, 2, 2));
        assert!(!leads_to(&assigned, 3, 1));
        assert!(!leads_to(&assigned, 4, 1));
    }

    #[test]
    fn non_evolving_species_keep_their_bytes() {
        let original = fixture_image(0x10_0000);
        let mut image = original.clone();
        let request = RandomizationRequest::new(8, [Category::Evolutions].into_iter().collect());
        Engine::new(request).run(&mut image).unwrap();

        let table = &schema::descriptors_for(Category::Evolutions)[0];
        for entry in 0..table.entry_count() {
            let base = table.entry_base(entry).unwrap();
            assert_eq!(image.read_u8(base).unwrap(), original.read_u8(base).unwrap());
            assert_eq!(image.read_u8(base + 1).unwrap(), original.read_u8(base + 1).unwrap());
            if original.read_u8(base).unwrap() == 0 {
                assert_eq!(image.read_u8(base + 2).unwrap(), original.read_u8(base + 2).unwrap());
            }
        }
    }
}
