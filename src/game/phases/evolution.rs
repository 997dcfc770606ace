use super::{GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::session::Session;
use crate::gate::GateOutcome;
use crate::phase::Step;
use tracing::info;

/// Evolves one member. Skipped when the member has nothing pending; the player may cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionPhase {
    member: usize,
}

impl EvolutionPhase {
    pub fn new(member: usize) -> Self {
        Self { member }
    }

    pub fn member(&self) -> usize {
        self.member
    }
}

impl Routine for EvolutionPhase {
    const NAME: &'static str = "evolution";

    fn validate(&self, session: &Session) -> bool {
        session
            .party
            .member(self.member)
            .and_then(|member| member.pending_evolution())
            .is_some()
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let Some(member) = session.party.member(self.member) else {
            return Ok(Step::End);
        };
        let Some(into) = member.pending_evolution() else {
            return Ok(Step::End);
        };
        let effect = Effect::Evolution {
            member: self.member,
            from: member.species,
            into,
        };
        let gate = session.present(queue, effect)?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        _queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        if outcome.confirmed() == Some(true) {
            if let Some(species) = session.party.evolve(self.member) {
                info!(member = self.member, species = %species, "Member evolved");
            }
        } else {
            info!(member = self.member, "Evolution cancelled");
            session.announce(Effect::text("evolution.cancelled"));
        }
        Ok(Step::End)
    }
}
