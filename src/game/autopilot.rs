//! Headless host: answers every presentation request with a fixed policy so a whole run can be
//! simulated and replayed.

use crate::error::RunError;
use crate::game::effects::{Effect, EffectRequest};
use crate::game::party::Species;
use crate::game::rewards::RewardTier;
use crate::game::run::GameRun;
use crate::game::session::Session;
use crate::gate::{ExternalFailure, GateValue};
use crate::scheduler::Delivery;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the autopilot does with a chest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ChestPolicy {
    #[default]
    Open,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Autopilot {
    /// Title menu option (0 new game, 1 daily run).
    pub title_choice: usize,
    pub starters: Vec<Species>,
    /// Seed answered to a daily seed request. `None` rejects it, as an offline client would.
    pub daily_seed: Option<String>,
    pub chest: ChestPolicy,
    /// Battles are won while the summed level of battle-ready members reaches
    /// `wave * strength_per_wave`.
    pub strength_per_wave: u32,
    pub evolve: bool,
    /// Upper bound on answered requests before the run is declared stalled.
    pub max_steps: usize,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            title_choice: 0,
            starters: vec![Species::Sproutling, Species::Emberkit, Species::Ripplet],
            daily_seed: None,
            chest: ChestPolicy::Open,
            strength_per_wave: 1,
            evolve: true,
            max_steps: 100_000,
        }
    }
}

/// Answer given to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    Resolve { value: GateValue },
    Reject { reason: String },
    /// No gate attached; nothing to answer.
    None,
}

/// One line of a simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub step: usize,
    pub wave: u32,
    pub effect: Effect,
    pub answer: Answer,
    /// The gate had been cancelled before it was answered.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

impl Autopilot {
    /// Pick the answer for `effect` given the current session.
    pub fn answer(&self, effect: &Effect, session: &Session) -> Answer {
        let value = match effect {
            Effect::Text { .. } | Effect::Animation { .. } | Effect::Fade { .. } => GateValue::Ack,
            Effect::Prompt { key, .. } => match key.as_str() {
                "title.menu" => GateValue::Choice(self.title_choice),
                "chest.query" => GateValue::Choice(match self.chest {
                    ChestPolicy::Open => 0,
                    ChestPolicy::Leave => 1,
                }),
                _ => GateValue::Choice(0),
            },
            Effect::StarterSelect { .. } => GateValue::Data(serde_json::Value::Array(
                self.starters
                    .iter()
                    .map(|species| serde_json::Value::String(species.name().to_string()))
                    .collect(),
            )),
            Effect::DailySeed => match &self.daily_seed {
                Some(seed) => GateValue::Data(serde_json::Value::String(seed.clone())),
                None => {
                    return Answer::Reject {
                        reason: "daily seed service unavailable".to_string(),
                    }
                }
            },
            Effect::Battle { wave, boss, .. } => {
                GateValue::Confirm(self.wins(session, *wave, boss.is_some()))
            }
            Effect::RewardOffer { tiers } => GateValue::Choice(best_offer(tiers)),
            Effect::Evolution { .. } => GateValue::Confirm(self.evolve),
        };
        Answer::Resolve { value }
    }

    fn wins(&self, session: &Session, wave: u32, boss: bool) -> bool {
        let strength: u32 = session
            .party
            .members()
            .iter()
            .filter(|member| member.allowed_in_battle())
            .map(|member| member.level)
            .sum();
        let needed = wave.saturating_mul(self.strength_per_wave) + if boss { 5 } else { 0 };
        strength >= needed
    }

    /// Answer requests until the run finishes.
    pub fn drive(&self, run: &mut GameRun) -> Result<Vec<TranscriptEntry>, RunError> {
        let mut transcript = Vec::new();
        loop {
            let requests = run.take_effects();
            if requests.is_empty() {
                if run.is_finished() {
                    return Ok(transcript);
                }
                return Err(RunError::Stalled {
                    steps: transcript.len(),
                    reason: format!("no pending effects, scheduler at {:?}", run.progress()),
                });
            }
            for EffectRequest { gate, effect } in requests {
                if transcript.len() >= self.max_steps {
                    return Err(RunError::Stalled {
                        steps: transcript.len(),
                        reason: format!("step limit {} reached", self.max_steps),
                    });
                }
                let wave = run.session().wave;
                let (answer, ignored) = match gate {
                    Some(gate) => {
                        let answer = self.answer(&effect, run.session());
                        let delivery = match &answer {
                            Answer::Resolve { value } => run.resolve(gate, value.clone())?,
                            Answer::Reject { reason } => {
                                run.reject(gate, ExternalFailure(reason.clone()))?
                            }
                            Answer::None => Delivery::Ignored,
                        };
                        (answer, delivery == Delivery::Ignored)
                    }
                    None => (Answer::None, false),
                };
                debug!(
                    step = transcript.len(),
                    kind = effect.kind(),
                    ignored,
                    "Answered effect"
                );
                transcript.push(TranscriptEntry {
                    step: transcript.len(),
                    wave,
                    effect,
                    answer,
                    ignored,
                });
            }
        }
    }
}

/// Index of the highest tier on offer. Ties go to the first.
fn best_offer(tiers: &[RewardTier]) -> usize {
    tiers
        .iter()
        .enumerate()
        .fold((0, None), |(best, top), (index, tier)| match top {
            Some(top) if top >= tier => (best, Some(top)),
            _ => (index, Some(tier)),
        })
        .0
}
