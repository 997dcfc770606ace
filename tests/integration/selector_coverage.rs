//! Weighted selection over the chest table: every draw maps to exactly one outcome, and the
//! seeded stream reproduces its draws.

use std::collections::BTreeMap;
use turnstile::error::TableError;
use turnstile::game::rewards::ChestOutcome;
use turnstile::game::rules::ChestWeights;
use turnstile::outcome::RandomBranchSelector;
use turnstile::rng::{RandomSource, RunSeed, ScriptedRng, SeededRng};

fn chest() -> RandomBranchSelector<ChestOutcome> {
    RandomBranchSelector::from_weights(ChestWeights::default().table()).unwrap()
}

#[test]
fn test_every_roll_maps_to_its_interval() {
    let selector = chest();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for roll in 0..selector.table().total() {
        let outcome = selector.draw(roll).unwrap();
        *counts.entry(outcome.to_string()).or_default() += 1;
    }

    assert_eq!(counts["trap"], 35);
    assert_eq!(counts["common_reward"], 20);
    assert_eq!(counts["ultra_reward"], 30);
    assert_eq!(counts["rogue_reward"], 10);
    assert_eq!(counts["master_reward"], 5);
}

#[test]
fn test_interval_boundaries() {
    let selector = chest();
    let cases = [
        (0, ChestOutcome::Trap),
        (34, ChestOutcome::Trap),
        (35, ChestOutcome::MasterReward),
        (39, ChestOutcome::MasterReward),
        (40, ChestOutcome::RogueReward),
        (49, ChestOutcome::RogueReward),
        (50, ChestOutcome::UltraReward),
        (79, ChestOutcome::UltraReward),
        (80, ChestOutcome::CommonReward),
        (99, ChestOutcome::CommonReward),
    ];
    for (roll, expected) in cases {
        assert_eq!(selector.draw(roll).unwrap(), &expected, "roll {}", roll);
    }
    assert_eq!(
        selector.draw(100),
        Err(TableError::OutOfRange {
            roll: 100,
            total: 100
        })
    );
}

#[test]
fn test_zero_weight_entry_is_never_selected() {
    let weights = ChestWeights {
        master: 0,
        ..ChestWeights::default()
    };
    let selector = RandomBranchSelector::from_weights(weights.table()).unwrap();
    assert_eq!(selector.table().total(), 95);
    for roll in 0..95 {
        assert_ne!(selector.draw(roll).unwrap(), &ChestOutcome::MasterReward);
    }
    assert_eq!(selector.draw(35).unwrap(), &ChestOutcome::RogueReward);
}

#[test]
fn test_degenerate_tables_are_rejected() {
    let empty: Vec<(u32, ChestOutcome)> = Vec::new();
    assert_eq!(
        RandomBranchSelector::from_weights(empty).unwrap_err(),
        TableError::Empty
    );
    assert_eq!(
        RandomBranchSelector::from_weights([(0, ChestOutcome::Trap)]).unwrap_err(),
        TableError::ZeroTotal
    );
    assert_eq!(
        RandomBranchSelector::from_weights([(u32::MAX, 'a'), (1, 'b')]).unwrap_err(),
        TableError::WeightOverflow
    );
}

#[test]
fn test_roll_consumes_exactly_one_draw() {
    let selector = chest();
    let mut rng = ScriptedRng::new(vec![96, 12]);
    let draw = selector.roll(&mut rng).unwrap();
    assert_eq!(draw.roll, 96);
    assert_eq!(draw.outcome, &ChestOutcome::CommonReward);
    assert_eq!(rng.consumed(), 1);
}

#[test]
fn test_seeded_stream_replays() {
    let selector = chest();
    let mut a = SeededRng::new(RunSeed::new("replay"));
    let mut b = SeededRng::new(RunSeed::new("replay"));
    let left: Vec<_> = (0..64).map(|_| *selector.roll(&mut a).unwrap().outcome).collect();
    let right: Vec<_> = (0..64).map(|_| *selector.roll(&mut b).unwrap().outcome).collect();
    assert_eq!(left, right);
    assert_eq!(a.draws(), 64);

    let mut restored = SeededRng::restore(RunSeed::new("replay"), a.position(), a.draws());
    assert_eq!(restored.next_int(1000), b.next_int(1000));
}
