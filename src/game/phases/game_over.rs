use super::{GamePhase, GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::session::{RunOutcome, Session};
use crate::gate::GateOutcome;
use crate::phase::Step;
use tracing::info;

const VICTORY_FADE_MS: u32 = 10_000;
const DEFEAT_FADE_MS: u32 = 5_000;

/// Fades out, wipes the queue, records the run summary and hands over to
/// [`PostGameOverPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverPhase {
    victory: bool,
}

impl GameOverPhase {
    pub fn new(victory: bool) -> Self {
        Self { victory }
    }

    pub fn is_victory(&self) -> bool {
        self.victory
    }
}

impl Routine for GameOverPhase {
    const NAME: &'static str = "game_over";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        if !self.victory && session.wave > session.rules.max_waves {
            self.victory = true;
        }
        let millis = if self.victory {
            VICTORY_FADE_MS
        } else {
            DEFEAT_FADE_MS
        };
        let gate = session.present(queue, Effect::Fade { millis })?;
        Ok(Step::Await(gate))
    }

    /// Runs whether the fade finished or failed.
    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        _outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        queue.clear();
        let outcome = if self.victory {
            RunOutcome::Victory
        } else {
            RunOutcome::Defeat
        };
        let summary = session.summarize(outcome);
        info!(
            outcome = ?summary.outcome,
            wave = summary.wave,
            items = summary.items,
            "Run over"
        );
        session.summary = Some(summary);
        queue.push(GamePhase::PostGameOver(PostGameOverPhase));
        Ok(Step::End)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostGameOverPhase;

impl Routine for PostGameOverPhase {
    const NAME: &'static str = "post_game_over";

    fn validate(&self, session: &Session) -> bool {
        session.summary.is_some()
    }

    fn start(&mut self, session: &mut Session, _queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        if let Some(summary) = &session.summary {
            let outcome = match summary.outcome {
                RunOutcome::Victory => "victory",
                RunOutcome::Defeat => "defeat",
            };
            let text = Effect::text("game_over.summary")
                .with_token("outcome", outcome)
                .with_token("wave", summary.wave)
                .with_token("items", summary.items);
            session.announce(text);
        }
        Ok(Step::End)
    }
}
