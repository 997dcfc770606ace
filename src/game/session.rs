//! Session context shared by every game phase, and its persistent snapshot.

use crate::error::{PhaseError, RunError, TableError};
use crate::game::effects::{Effect, EffectRequest};
use crate::game::party::{Party, Species};
use crate::game::phases::GamePhase;
use crate::game::rewards::{ChestOutcome, Inventory, RewardPlan, RewardTier};
use crate::game::rules::RunConfig;
use crate::gate::{GateHandle, GateOutcome};
use crate::outcome::RandomBranchSelector;
use crate::rng::{RandomSource, RunSeed, SeededRng, SessionRng, StreamPosition};
use crate::scheduler::QueueHandle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Victory,
    Defeat,
}

/// The battle currently being set up or fought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub boss: Option<Species>,
    pub double: bool,
}

/// Recorded by the game-over phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: String,
    pub mode: GameMode,
    pub outcome: RunOutcome,
    pub wave: u32,
    pub party: Party,
    pub items: u32,
}

/// Mutable state of a run. Owned by the host, lent to each phase routine.
pub struct Session {
    pub rng: SessionRng,
    pub rules: RunConfig,
    /// Date the host considers "today"; keys the offline daily seed.
    pub today: NaiveDate,
    pub mode: GameMode,
    pub wave: u32,
    pub party: Party,
    pub inventory: Inventory,
    /// Reward plan stored for the next reward phase.
    pub rewards: Option<RewardPlan>,
    /// Chest outcome of the current wave, once drawn.
    pub encounter: Option<ChestOutcome>,
    pub battle: Option<BattleState>,
    /// Party slots whose summon animation has finished.
    pub field: Vec<usize>,
    pub summary: Option<RunSummary>,
    effects: Vec<EffectRequest>,
    chest: RandomBranchSelector<ChestOutcome>,
    reward_pool: RandomBranchSelector<RewardTier>,
}

impl Session {
    pub fn new(
        rules: RunConfig,
        rng: impl Into<SessionRng>,
        today: NaiveDate,
    ) -> Result<Self, TableError> {
        let chest = rules.chest_selector()?;
        let reward_pool = rules.reward_selector()?;
        Ok(Self {
            rng: rng.into(),
            rules,
            today,
            mode: GameMode::default(),
            wave: 0,
            party: Party::default(),
            inventory: Inventory::default(),
            rewards: None,
            encounter: None,
            battle: None,
            field: Vec::new(),
            summary: None,
            effects: Vec::new(),
            chest,
            reward_pool,
        })
    }

    /// Rebuild a session from saved domain data.
    pub fn restore(
        rules: RunConfig,
        snapshot: SessionSnapshot,
        today: NaiveDate,
    ) -> Result<Self, RunError> {
        let rng = SeededRng::restore(snapshot.seed, snapshot.position, snapshot.draws);
        let mut session = Session::new(rules, rng, today)?;
        session.mode = snapshot.mode;
        session.wave = snapshot.wave;
        session.party = snapshot.party;
        session.inventory = snapshot.inventory;
        session.rewards = snapshot.rewards;
        Ok(session)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, RunError> {
        let rng = self.rng.as_seeded().ok_or_else(|| {
            RunError::Snapshot("scripted random sources cannot be saved".to_string())
        })?;
        Ok(SessionSnapshot {
            seed: rng.seed().clone(),
            position: rng.position(),
            draws: rng.draws(),
            mode: self.mode,
            wave: self.wave,
            party: self.party.clone(),
            inventory: self.inventory.clone(),
            rewards: self.rewards.clone(),
        })
    }

    /// Switch to a fresh stream for `seed`.
    pub fn reseed(&mut self, seed: RunSeed) {
        debug!(seed_fingerprint = %seed.fingerprint(), "Reseeding session");
        self.rng = SeededRng::new(seed).into();
    }

    /// Draw the chest branch. Exactly one value is taken from the stream.
    pub fn roll_chest(&mut self) -> Result<(u32, ChestOutcome), TableError> {
        let draw = self.chest.roll(&mut self.rng)?;
        Ok((draw.roll, *draw.outcome))
    }

    /// Offers for `plan`, drawing from the reward pool when it fills slots.
    pub fn reward_offers(&mut self, plan: &RewardPlan) -> Result<Vec<RewardTier>, TableError> {
        plan.offers(&self.reward_pool, &mut self.rng)
    }

    pub fn next_int(&mut self, bound: u32) -> u32 {
        self.rng.next_int(bound)
    }

    /// Request `effect` and open a gate the calling phase will await.
    pub fn present(
        &mut self,
        queue: &mut QueueHandle<'_, GamePhase>,
        effect: Effect,
    ) -> Result<GateHandle, PhaseError> {
        let gate = queue.open_gate()?;
        self.effects.push(EffectRequest {
            gate: Some(gate),
            effect,
        });
        Ok(gate)
    }

    /// Request `effect` without waiting; `on_done` runs when the host settles it.
    pub fn present_detached<F>(
        &mut self,
        queue: &mut QueueHandle<'_, GamePhase>,
        effect: Effect,
        on_done: F,
    ) -> GateHandle
    where
        F: for<'q> FnOnce(&mut Session, &mut QueueHandle<'q, GamePhase>, GateOutcome) + 'static,
    {
        let gate = queue.open_detached(on_done);
        self.effects.push(EffectRequest {
            gate: Some(gate),
            effect,
        });
        gate
    }

    /// Fire-and-forget request; nothing waits on it.
    pub fn announce(&mut self, effect: Effect) {
        self.effects.push(EffectRequest { gate: None, effect });
    }

    pub fn pending_effects(&self) -> &[EffectRequest] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.effects)
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.summary.as_ref().map(|summary| summary.outcome)
    }

    pub(crate) fn summarize(&self, outcome: RunOutcome) -> RunSummary {
        let seed = self
            .rng
            .as_seeded()
            .map(|rng| rng.seed().to_string())
            .unwrap_or_else(|| "scripted".to_string());
        RunSummary {
            seed,
            mode: self.mode,
            outcome,
            wave: self.wave,
            party: self.party.clone(),
            items: self.inventory.total(),
        }
    }
}

/// Serialisable domain data of a run. The phase queue is never saved; a resumed run
/// rebuilds it from the wave it was saved on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub seed: RunSeed,
    pub position: StreamPosition,
    pub draws: u64,
    pub mode: GameMode,
    pub wave: u32,
    pub party: Party,
    pub inventory: Inventory,
    #[serde(default)]
    pub rewards: Option<RewardPlan>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, RunError> {
        serde_json::to_string_pretty(self).map_err(|e| RunError::Snapshot(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, RunError> {
        serde_json::from_str(text).map_err(|e| RunError::Snapshot(e.to_string()))
    }
}
