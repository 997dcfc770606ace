//! Battle setup, summons and the battle itself. Combat runs outside the crate; the battle
//! phase only learns whether it was won.

use super::{run_next, EvolutionPhase, GamePhase, GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::party::Species;
use crate::game::session::{BattleState, Session};
use crate::gate::GateOutcome;
use crate::phase::Step;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BattleInitPhase {
    boss: Option<Species>,
}

impl BattleInitPhase {
    pub fn new(boss: Option<Species>) -> Self {
        Self { boss }
    }

    pub fn boss(&self) -> Option<Species> {
        self.boss
    }
}

impl Routine for BattleInitPhase {
    const NAME: &'static str = "battle_init";

    fn validate(&self, session: &Session) -> bool {
        session.party.allowed_in_battle() > 0
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let double = session.rules.double_battles && session.party.allowed_in_battle() > 1;
        session.battle = Some(BattleState {
            boss: self.boss,
            double,
        });
        session.field.clear();

        let mut text = Effect::text("battle.init").with_token("wave", session.wave);
        if let Some(boss) = self.boss {
            text = text.with_token("boss", boss);
        }
        session.announce(text);

        let mut next = vec![GamePhase::Summon(SummonPhase::new(0))];
        if double {
            next.push(GamePhase::Summon(SummonPhase::new(1)));
        }
        next.push(GamePhase::Battle(BattlePhase));
        run_next(queue, next);
        Ok(Step::End)
    }
}

/// Sends a member onto the field. The summon animation plays on a detached gate; the phase
/// does not wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummonPhase {
    slot: usize,
}

impl SummonPhase {
    pub fn new(slot: usize) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Routine for SummonPhase {
    const NAME: &'static str = "summon";

    fn validate(&self, session: &Session) -> bool {
        self.slot < session.party.allowed_in_battle()
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let Some(member) = session
            .party
            .members()
            .iter()
            .enumerate()
            .filter(|(_, member)| member.allowed_in_battle())
            .map(|(index, _)| index)
            .nth(self.slot)
        else {
            return Ok(Step::End);
        };

        session.present_detached(
            queue,
            Effect::animation("summon"),
            move |session, _queue, outcome| {
                if outcome.is_rejected() {
                    warn!(member, "Summon animation failed");
                }
                session.field.push(member);
            },
        );
        debug!(slot = self.slot, member, "Summoning member");
        Ok(Step::End)
    }
}

/// Hands the battle to the combat service and branches on the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattlePhase;

impl Routine for BattlePhase {
    const NAME: &'static str = "battle";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let battle = session.battle.clone().unwrap_or(BattleState {
            boss: None,
            double: false,
        });
        let gate = session.present(
            queue,
            Effect::Battle {
                wave: session.wave,
                boss: battle.boss,
                double: battle.double,
            },
        )?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        match outcome.confirmed() {
            Some(true) => {
                let evolving = session.party.gain_levels(session.rules.levels_per_win);
                info!(wave = session.wave, evolving = evolving.len(), "Battle won");
                let mut next = vec![GamePhase::reward()];
                next.extend(
                    evolving
                        .into_iter()
                        .map(|member| GamePhase::Evolution(EvolutionPhase::new(member))),
                );
                run_next(queue, next);
            }
            Some(false) => {
                info!(wave = session.wave, "Battle lost");
                queue.clear();
                queue.push(GamePhase::game_over(false));
            }
            None => {
                warn!(?outcome, wave = session.wave, "Battle result unavailable, fleeing");
                session.rewards = None;
                session.announce(Effect::text("battle.fled"));
            }
        }
        Ok(Step::End)
    }

    fn end(&mut self, session: &mut Session, _queue: &mut GameQueue<'_>) -> Result<(), PhaseError> {
        session.battle = None;
        Ok(())
    }
}
