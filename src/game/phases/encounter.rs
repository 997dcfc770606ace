//! Mysterious chest encounter.
//!
//! The player may open the chest or leave. Opening takes exactly one draw from the chest
//! table. Reward branches store their plan and queue one reward phase after the result text.
//! The trap knocks out the strongest eligible member, then either starts a boss battle or,
//! when nobody is left to fight, resets the queue to a single game over.

use super::{run_next, GamePhase, GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::party::Species;
use crate::game::rewards::{ChestOutcome, RewardPlan};
use crate::game::session::Session;
use crate::gate::GateOutcome;
use crate::phase::Step;
use tracing::{debug, info, warn};

const OPEN: usize = 0;

/// Boss fought when the trap springs.
pub const CHEST_BOSS: Species = Species::Chestling;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChestStage {
    /// Waiting for open/leave.
    #[default]
    Choosing,
    /// Reward branch: waiting for the result text to be dismissed.
    Rewarded,
    /// Trap branch: waiting for the knock-out text to be dismissed.
    Trapped,
    /// Player walked away.
    Left,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MysteryEncounterPhase {
    stage: ChestStage,
    roll: Option<u32>,
    outcome: Option<ChestOutcome>,
}

impl MysteryEncounterPhase {
    /// Wave range and party size requirements.
    pub fn eligible(session: &Session) -> bool {
        session.rules.in_encounter_range(session.wave)
            && session
                .rules
                .party_in_range(session.party.allowed_in_battle())
    }

    pub fn stage(&self) -> ChestStage {
        self.stage
    }

    /// The drawn value and branch, once the chest was opened.
    pub fn drawn(&self) -> Option<(u32, ChestOutcome)> {
        self.roll.zip(self.outcome)
    }

    fn open(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let (roll, outcome) = session.roll_chest()?;
        self.roll = Some(roll);
        self.outcome = Some(outcome);
        session.encounter = Some(outcome);
        info!(wave = session.wave, roll, outcome = %outcome, "Chest opened");

        let sprite = if outcome == ChestOutcome::Trap {
            "chest.open.red"
        } else {
            "chest.open.blue"
        };
        session.announce(Effect::animation(sprite));

        match outcome.reward_plan() {
            Some(plan) => {
                session.rewards = Some(plan);
                self.stage = ChestStage::Rewarded;
                let gate = session.present(queue, Effect::text(outcome.message_key()))?;
                Ok(Step::Await(gate))
            }
            None => {
                let text = Effect::text(outcome.message_key());
                let text = match session.party.strongest_eligible() {
                    Some(index) => {
                        let member = session.party.knock_out(index).map(|m| m.species);
                        debug!(member = index, species = ?member, "Trap knocked out a member");
                        match member {
                            Some(species) => text.with_token("member", species),
                            None => text,
                        }
                    }
                    None => text,
                };
                self.stage = ChestStage::Trapped;
                let gate = session.present(queue, text)?;
                Ok(Step::Await(gate))
            }
        }
    }

    fn spring_trap(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) {
        if session.party.allowed_in_battle() > 0 {
            session.rewards = Some(RewardPlan::fill_remaining());
            run_next(queue, vec![GamePhase::battle_init(Some(CHEST_BOSS))]);
        } else {
            info!(wave = session.wave, "Trap left no member able to battle");
            queue.clear();
            queue.push(GamePhase::game_over(false));
        }
    }
}

impl Routine for MysteryEncounterPhase {
    const NAME: &'static str = "mystery_encounter";

    fn validate(&self, session: &Session) -> bool {
        Self::eligible(session)
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        self.stage = ChestStage::Choosing;
        let gate = session.present(queue, Effect::prompt("chest.query", &["open", "leave"]))?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        match self.stage {
            ChestStage::Choosing => {
                if outcome.choice() == Some(OPEN) {
                    return self.open(session, queue);
                }
                if outcome.is_rejected() {
                    warn!(?outcome, "Chest prompt failed, leaving the chest");
                }
                self.stage = ChestStage::Left;
                session.announce(Effect::text("chest.leave"));
                Ok(Step::End)
            }
            ChestStage::Rewarded => {
                run_next(queue, vec![GamePhase::reward()]);
                Ok(Step::End)
            }
            ChestStage::Trapped => {
                self.spring_trap(session, queue);
                Ok(Step::End)
            }
            ChestStage::Left => Ok(Step::End),
        }
    }
}
