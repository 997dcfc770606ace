//! The closed set of game phases.
//!
//! Each variant wraps a struct holding that phase's own state. [`GamePhase`] implements the
//! scheduler's [`Phase`] contract by dispatching to the variant.

mod battle;
mod encounter;
mod evolution;
mod game_over;
mod message;
mod reward;
mod title;
mod wave;

pub use battle::{BattleInitPhase, BattlePhase, SummonPhase};
pub use encounter::{ChestStage, MysteryEncounterPhase};
pub use evolution::EvolutionPhase;
pub use game_over::{GameOverPhase, PostGameOverPhase};
pub use message::MessagePhase;
pub use reward::RewardPhase;
pub use title::{SelectStarterPhase, TitlePhase};
pub use wave::NewWavePhase;

use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::party::Species;
use crate::game::session::Session;
use crate::gate::GateOutcome;
use crate::phase::{Phase, Step};
use crate::scheduler::QueueHandle;

/// Queue handle as seen by game phases.
pub type GameQueue<'a> = QueueHandle<'a, GamePhase>;

/// Per-variant routines. Same shape as [`Phase`], with the queue fixed to [`GamePhase`].
pub(crate) trait Routine {
    const NAME: &'static str;

    fn validate(&self, _session: &Session) -> bool {
        true
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>)
        -> Result<Step, PhaseError>;

    fn resume(
        &mut self,
        _session: &mut Session,
        _queue: &mut GameQueue<'_>,
        _outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        Ok(Step::End)
    }

    fn end(&mut self, _session: &mut Session, _queue: &mut GameQueue<'_>) -> Result<(), PhaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GamePhase {
    Title(TitlePhase),
    SelectStarter(SelectStarterPhase),
    NewWave(NewWavePhase),
    MysteryEncounter(MysteryEncounterPhase),
    Message(MessagePhase),
    Reward(RewardPhase),
    BattleInit(BattleInitPhase),
    Summon(SummonPhase),
    Battle(BattlePhase),
    Evolution(EvolutionPhase),
    GameOver(GameOverPhase),
    PostGameOver(PostGameOverPhase),
}

macro_rules! dispatch {
    ($phase:expr, $inner:ident => $call:expr) => {
        match $phase {
            GamePhase::Title($inner) => $call,
            GamePhase::SelectStarter($inner) => $call,
            GamePhase::NewWave($inner) => $call,
            GamePhase::MysteryEncounter($inner) => $call,
            GamePhase::Message($inner) => $call,
            GamePhase::Reward($inner) => $call,
            GamePhase::BattleInit($inner) => $call,
            GamePhase::Summon($inner) => $call,
            GamePhase::Battle($inner) => $call,
            GamePhase::Evolution($inner) => $call,
            GamePhase::GameOver($inner) => $call,
            GamePhase::PostGameOver($inner) => $call,
        }
    };
}

fn name_of<R: Routine>(_routine: &R) -> &'static str {
    R::NAME
}

impl Phase for GamePhase {
    type Context = Session;

    fn name(&self) -> &'static str {
        dispatch!(self, inner => name_of(inner))
    }

    fn validate(&self, session: &Session) -> bool {
        dispatch!(self, inner => inner.validate(session))
    }

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        dispatch!(self, inner => inner.start(session, queue))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        dispatch!(self, inner => inner.resume(session, queue, outcome))
    }

    fn end(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<(), PhaseError> {
        dispatch!(self, inner => inner.end(session, queue))
    }
}

/// Queue `phases` to run next, in the given order, ahead of anything already queued.
pub(crate) fn run_next(queue: &mut GameQueue<'_>, phases: Vec<GamePhase>) {
    for phase in phases.into_iter().rev() {
        queue.unshift(phase);
    }
}

impl GamePhase {
    pub fn title() -> Self {
        GamePhase::Title(TitlePhase::default())
    }

    pub fn select_starter() -> Self {
        GamePhase::SelectStarter(SelectStarterPhase)
    }

    pub fn new_wave() -> Self {
        GamePhase::NewWave(NewWavePhase::default())
    }

    /// Re-enter the saved wave of a resumed run without advancing the wave counter.
    pub fn replay_wave() -> Self {
        GamePhase::NewWave(NewWavePhase::replay())
    }

    pub fn mystery_encounter() -> Self {
        GamePhase::MysteryEncounter(MysteryEncounterPhase::default())
    }

    pub fn message(key: &str) -> Self {
        GamePhase::Message(MessagePhase::new(Effect::text(key)))
    }

    pub fn reward() -> Self {
        GamePhase::Reward(RewardPhase::default())
    }

    pub fn battle_init(boss: Option<Species>) -> Self {
        GamePhase::BattleInit(BattleInitPhase::new(boss))
    }

    pub fn game_over(victory: bool) -> Self {
        GamePhase::GameOver(GameOverPhase::new(victory))
    }

    pub fn is_battle(&self) -> bool {
        matches!(
            self,
            GamePhase::BattleInit(_) | GamePhase::Summon(_) | GamePhase::Battle(_)
        )
    }
}
