use super::{GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::session::Session;
use crate::phase::Step;

/// Shows one effect and waits for the host to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePhase {
    effect: Effect,
}

impl MessagePhase {
    pub fn new(effect: Effect) -> Self {
        Self { effect }
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }
}

impl Routine for MessagePhase {
    const NAME: &'static str = "message";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let gate = session.present(queue, self.effect.clone())?;
        Ok(Step::Await(gate))
    }
}
