//! Property-based tests for determinism guarantees

use proptest::prelude::*;
use turnstile::error::PhaseError;
use turnstile::outcome::{RandomBranchSelector, WeightedTable};
use turnstile::phase::{Phase, Step};
use turnstile::rng::{RandomSource, RunSeed, SeededRng};
use turnstile::scheduler::{QueueHandle, Scheduler};

fn weights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..50, 1..8).prop_filter("needs a positive weight", |weights| {
        weights.iter().any(|weight| *weight > 0)
    })
}

/// Phase that logs its number and optionally unshifts a child.
#[derive(Debug, Clone)]
struct Numbered {
    id: u32,
    child: Option<u32>,
}

impl Phase for Numbered {
    type Context = Vec<u32>;

    fn name(&self) -> &'static str {
        "numbered"
    }

    fn start(
        &mut self,
        log: &mut Vec<u32>,
        queue: &mut QueueHandle<'_, Self>,
    ) -> Result<Step, PhaseError> {
        log.push(self.id);
        if let Some(child) = self.child {
            queue.unshift(Numbered {
                id: child,
                child: None,
            });
        }
        Ok(Step::End)
    }
}

proptest! {
    /// Every roll in [0, T) lands in exactly one entry, and that entry's interval holds it.
    #[test]
    fn test_selector_partitions_the_range(weights in weights()) {
        let table = WeightedTable::new(weights.iter().copied().zip(0usize..)).unwrap();
        let selector = RandomBranchSelector::new(table.clone());
        let mut hits = vec![0u32; weights.len()];
        for roll in 0..table.total() {
            let index = *selector.draw(roll).unwrap();
            let (start, end) = table.interval(index).unwrap();
            prop_assert!(start <= roll && roll < end);
            hits[index] += 1;
        }
        prop_assert_eq!(hits, weights);
    }

    /// Drawing is a pure function of (table, roll).
    #[test]
    fn test_draw_is_pure(weights in weights(), roll in any::<u32>()) {
        let selector = RandomBranchSelector::from_weights(weights.iter().copied().zip(0usize..)).unwrap();
        let roll = roll % selector.table().total();
        prop_assert_eq!(selector.draw(roll), selector.draw(roll));
    }

    /// Two streams with the same seed produce the same draws.
    #[test]
    fn test_same_seed_same_stream(seed in "[a-z0-9]{1,16}", bounds in prop::collection::vec(1u32..1000, 1..32)) {
        let mut a = SeededRng::new(RunSeed::new(seed.clone()));
        let mut b = SeededRng::new(RunSeed::new(seed));
        for bound in bounds {
            let value = a.next_int(bound);
            prop_assert!(value < bound);
            prop_assert_eq!(value, b.next_int(bound));
        }
    }

    /// Pushed phases run in push order; a child unshifted by a phase runs right after it.
    #[test]
    fn test_push_and_unshift_ordering(children in prop::collection::vec(any::<bool>(), 1..12)) {
        let mut scheduler = Scheduler::default();
        let mut expected = Vec::new();
        for (index, spawns) in children.iter().enumerate() {
            let id = index as u32 * 2;
            let child = spawns.then_some(id + 1);
            scheduler.push(Numbered { id, child });
            expected.push(id);
            if let Some(child) = child {
                expected.push(child);
            }
        }

        let mut log = Vec::new();
        scheduler.advance(&mut log).unwrap();
        prop_assert_eq!(log, expected);
        prop_assert!(scheduler.is_idle());
    }
}
