//! Reward tiers, chest outcomes and the plans that turn them into offers.

use crate::error::TableError;
use crate::outcome::RandomBranchSelector;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Offers shown when a plan asks to fill the remaining slots.
pub const OFFER_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardTier {
    Common,
    Great,
    Ultra,
    Rogue,
    Master,
}

impl fmt::Display for RewardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RewardTier::Common => "common",
            RewardTier::Great => "great",
            RewardTier::Ultra => "ultra",
            RewardTier::Rogue => "rogue",
            RewardTier::Master => "master",
        };
        f.write_str(name)
    }
}

/// Branches of the mysterious chest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestOutcome {
    Trap,
    CommonReward,
    UltraReward,
    RogueReward,
    MasterReward,
}

impl ChestOutcome {
    /// Rewards granted by this outcome. `None` for the trap.
    pub fn reward_plan(self) -> Option<RewardPlan> {
        use RewardTier::*;
        let tiers = match self {
            ChestOutcome::Trap => return None,
            ChestOutcome::CommonReward => vec![Common, Common, Great, Great],
            ChestOutcome::UltraReward => vec![Ultra, Ultra, Ultra],
            ChestOutcome::RogueReward => vec![Rogue, Rogue],
            ChestOutcome::MasterReward => vec![Master],
        };
        Some(RewardPlan::guaranteed(tiers))
    }

    /// Text key of the result message.
    pub fn message_key(self) -> &'static str {
        match self {
            ChestOutcome::Trap => "chest.open.bad",
            ChestOutcome::CommonReward => "chest.open.normal",
            ChestOutcome::UltraReward => "chest.open.good",
            ChestOutcome::RogueReward => "chest.open.great",
            ChestOutcome::MasterReward => "chest.open.amazing",
        }
    }
}

impl fmt::Display for ChestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChestOutcome::Trap => "trap",
            ChestOutcome::CommonReward => "common_reward",
            ChestOutcome::UltraReward => "ultra_reward",
            ChestOutcome::RogueReward => "rogue_reward",
            ChestOutcome::MasterReward => "master_reward",
        };
        f.write_str(name)
    }
}

/// What a reward phase offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPlan {
    /// Tiers always offered, in order.
    pub guaranteed: Vec<RewardTier>,
    /// Top up to [`OFFER_SLOTS`] with draws from the reward pool.
    pub fill_remaining: bool,
}

impl RewardPlan {
    pub fn guaranteed(tiers: Vec<RewardTier>) -> Self {
        Self {
            guaranteed: tiers,
            fill_remaining: false,
        }
    }

    pub fn fill_remaining() -> Self {
        Self {
            guaranteed: Vec::new(),
            fill_remaining: true,
        }
    }

    /// Concrete offers. Fill-remaining consumes one draw per filled slot.
    pub fn offers<R: RandomSource + ?Sized>(
        &self,
        pool: &RandomBranchSelector<RewardTier>,
        rng: &mut R,
    ) -> Result<Vec<RewardTier>, TableError> {
        let mut offers = self.guaranteed.clone();
        if self.fill_remaining {
            while offers.len() < OFFER_SLOTS {
                offers.push(*pool.roll(rng)?.outcome);
            }
        }
        Ok(offers)
    }
}

/// Items collected during a run, counted per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    items: BTreeMap<RewardTier, u32>,
}

impl Inventory {
    pub fn add(&mut self, tier: RewardTier) {
        *self.items.entry(tier).or_insert(0) += 1;
    }

    pub fn count(&self, tier: RewardTier) -> u32 {
        self.items.get(&tier).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.items.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RewardTier, u32)> + '_ {
        self.items.iter().map(|(tier, count)| (*tier, *count))
    }
}
