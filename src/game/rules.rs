//! Run rules: wave layout, party limits and the weight tables phases draw from.

use crate::error::TableError;
use crate::game::rewards::{ChestOutcome, RewardTier};
use crate::outcome::RandomBranchSelector;
use serde::{Deserialize, Serialize};

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Waves to clear for a victory
    #[serde(default = "default_max_waves")]
    pub max_waves: u32,

    /// First wave a chest encounter may appear on
    #[serde(default = "default_encounter_wave_start")]
    pub encounter_wave_start: u32,

    /// Last wave a chest encounter may appear on
    #[serde(default = "default_encounter_wave_end")]
    pub encounter_wave_end: u32,

    /// Within the encounter range, every n-th wave is a chest (0 disables chests)
    #[serde(default = "default_encounter_every")]
    pub encounter_every: u32,

    /// Fewest members allowed in battle for a chest to appear
    #[serde(default = "default_min_party")]
    pub min_party: usize,

    /// Most members allowed in battle for a chest to appear
    #[serde(default = "default_max_party")]
    pub max_party: usize,

    /// Level of the starter party
    #[serde(default = "default_starting_level")]
    pub starting_level: u32,

    /// Starters rolled for a daily run
    #[serde(default = "default_daily_party_size")]
    pub daily_party_size: usize,

    /// Levels gained by each battler after a won battle
    #[serde(default = "default_levels_per_win")]
    pub levels_per_win: u32,

    /// Summon a second battler when more than one member is allowed in battle
    #[serde(default)]
    pub double_battles: bool,

    #[serde(default)]
    pub chest: ChestWeights,

    #[serde(default)]
    pub reward_pool: RewardPoolWeights,
}

fn default_max_waves() -> u32 {
    200
}

fn default_encounter_wave_start() -> u32 {
    10
}

fn default_encounter_wave_end() -> u32 {
    180
}

fn default_encounter_every() -> u32 {
    5
}

fn default_min_party() -> usize {
    2
}

fn default_max_party() -> usize {
    6
}

fn default_starting_level() -> u32 {
    5
}

fn default_daily_party_size() -> usize {
    3
}

fn default_levels_per_win() -> u32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_waves: default_max_waves(),
            encounter_wave_start: default_encounter_wave_start(),
            encounter_wave_end: default_encounter_wave_end(),
            encounter_every: default_encounter_every(),
            min_party: default_min_party(),
            max_party: default_max_party(),
            starting_level: default_starting_level(),
            daily_party_size: default_daily_party_size(),
            levels_per_win: default_levels_per_win(),
            double_battles: false,
            chest: ChestWeights::default(),
            reward_pool: RewardPoolWeights::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_waves == 0 {
            return Err("max_waves must be at least 1".to_string());
        }
        if self.encounter_wave_start > self.encounter_wave_end {
            return Err(format!(
                "encounter_wave_start ({}) is after encounter_wave_end ({})",
                self.encounter_wave_start, self.encounter_wave_end
            ));
        }
        if self.min_party == 0 || self.min_party > self.max_party {
            return Err(format!(
                "party range {}..={} is empty",
                self.min_party, self.max_party
            ));
        }
        if self.daily_party_size == 0 {
            return Err("daily_party_size must be at least 1".to_string());
        }
        self.chest_selector()
            .map_err(|e| format!("chest weights: {}", e))?;
        self.reward_selector()
            .map_err(|e| format!("reward_pool weights: {}", e))?;
        Ok(())
    }

    /// Whether `wave` hosts a chest encounter.
    pub fn is_encounter_wave(&self, wave: u32) -> bool {
        self.encounter_every > 0
            && self.in_encounter_range(wave)
            && (wave - self.encounter_wave_start) % self.encounter_every == 0
    }

    pub fn in_encounter_range(&self, wave: u32) -> bool {
        (self.encounter_wave_start..=self.encounter_wave_end).contains(&wave)
    }

    pub fn party_in_range(&self, allowed: usize) -> bool {
        (self.min_party..=self.max_party).contains(&allowed)
    }

    pub fn chest_selector(&self) -> Result<RandomBranchSelector<ChestOutcome>, TableError> {
        RandomBranchSelector::from_weights(self.chest.table())
    }

    pub fn reward_selector(&self) -> Result<RandomBranchSelector<RewardTier>, TableError> {
        RandomBranchSelector::from_weights(self.reward_pool.table())
    }
}

/// Chest branch weights, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestWeights {
    #[serde(default = "default_trap")]
    pub trap: u32,
    #[serde(default = "default_common")]
    pub common: u32,
    #[serde(default = "default_ultra")]
    pub ultra: u32,
    #[serde(default = "default_rogue")]
    pub rogue: u32,
    #[serde(default = "default_master")]
    pub master: u32,
}

fn default_trap() -> u32 {
    35
}

fn default_common() -> u32 {
    20
}

fn default_ultra() -> u32 {
    30
}

fn default_rogue() -> u32 {
    10
}

fn default_master() -> u32 {
    5
}

impl Default for ChestWeights {
    fn default() -> Self {
        Self {
            trap: default_trap(),
            common: default_common(),
            ultra: default_ultra(),
            rogue: default_rogue(),
            master: default_master(),
        }
    }
}

impl ChestWeights {
    /// Low rolls spring the trap; the rarest reward sits just above it and the common one on
    /// top: `[0,35)` trap, `[35,40)` master, `[40,50)` rogue, `[50,80)` ultra, `[80,100)` common.
    pub fn table(&self) -> [(u32, ChestOutcome); 5] {
        [
            (self.trap, ChestOutcome::Trap),
            (self.master, ChestOutcome::MasterReward),
            (self.rogue, ChestOutcome::RogueReward),
            (self.ultra, ChestOutcome::UltraReward),
            (self.common, ChestOutcome::CommonReward),
        ]
    }
}

/// Weights used when a reward plan fills its remaining slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPoolWeights {
    #[serde(default = "default_pool_common")]
    pub common: u32,
    #[serde(default = "default_pool_great")]
    pub great: u32,
    #[serde(default = "default_pool_ultra")]
    pub ultra: u32,
    #[serde(default = "default_pool_rogue")]
    pub rogue: u32,
    #[serde(default = "default_pool_master")]
    pub master: u32,
}

fn default_pool_common() -> u32 {
    40
}

fn default_pool_great() -> u32 {
    30
}

fn default_pool_ultra() -> u32 {
    20
}

fn default_pool_rogue() -> u32 {
    8
}

fn default_pool_master() -> u32 {
    2
}

impl Default for RewardPoolWeights {
    fn default() -> Self {
        Self {
            common: default_pool_common(),
            great: default_pool_great(),
            ultra: default_pool_ultra(),
            rogue: default_pool_rogue(),
            master: default_pool_master(),
        }
    }
}

impl RewardPoolWeights {
    pub fn table(&self) -> [(u32, RewardTier); 5] {
        [
            (self.common, RewardTier::Common),
            (self.great, RewardTier::Great),
            (self.ultra, RewardTier::Ultra),
            (self.rogue, RewardTier::Rogue),
            (self.master, RewardTier::Master),
        ]
    }
}
