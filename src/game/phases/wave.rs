use super::encounter::MysteryEncounterPhase;
use super::{run_next, GamePhase, GameQueue, MessagePhase, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::session::Session;
use crate::phase::Step;
use tracing::{debug, info};

/// Opens a wave: picks the chest encounter or a wild battle, and queues the next wave behind
/// it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewWavePhase {
    replay: bool,
}

impl NewWavePhase {
    pub fn replay() -> Self {
        Self { replay: true }
    }
}

impl Routine for NewWavePhase {
    const NAME: &'static str = "new_wave";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        if !self.replay || session.wave == 0 {
            session.wave += 1;
        }
        session.encounter = None;
        session.battle = None;
        session.field.clear();

        if session.wave > session.rules.max_waves {
            info!(wave = session.wave, "Final wave cleared");
            queue.push(GamePhase::game_over(true));
            return Ok(Step::End);
        }
        if session.party.allowed_in_battle() == 0 {
            info!(wave = session.wave, "No member can battle");
            queue.push(GamePhase::game_over(false));
            return Ok(Step::End);
        }

        let chest = session.rules.is_encounter_wave(session.wave)
            && MysteryEncounterPhase::eligible(session);
        debug!(wave = session.wave, chest, "Wave content chosen");

        let content = if chest {
            GamePhase::mystery_encounter()
        } else {
            GamePhase::battle_init(None)
        };
        let intro = GamePhase::Message(MessagePhase::new(
            Effect::text("wave.start").with_token("wave", session.wave),
        ));
        run_next(queue, vec![intro, content]);
        queue.push(GamePhase::new_wave());
        Ok(Step::End)
    }
}
