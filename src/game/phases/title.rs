//! Title menu and starter selection.

use super::{GamePhase, GameQueue, Routine};
use crate::error::PhaseError;
use crate::game::effects::Effect;
use crate::game::party::{Member, Party, Species, MAX_PARTY};
use crate::game::rewards::Inventory;
use crate::game::session::{GameMode, Session};
use crate::gate::{GateOutcome, GateValue};
use crate::phase::Step;
use crate::rng::RunSeed;
use tracing::{info, warn};

const NEW_GAME: usize = 0;
const DAILY_RUN: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TitleStage {
    #[default]
    Menu,
    DailySeed,
}

/// Offers a new classic game or the daily run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitlePhase {
    stage: TitleStage,
    chosen: Option<GameMode>,
}

impl TitlePhase {
    fn begin_daily(&mut self, session: &mut Session, seed: RunSeed) {
        info!(seed_fingerprint = %seed.fingerprint(), "Starting daily run");
        session.reseed(seed);
        let rules = &session.rules;
        let (size, level) = (rules.daily_party_size, rules.starting_level);
        session.party = Party::roll_starters(&mut session.rng, size, level);
        session.mode = GameMode::Daily;
        self.chosen = Some(GameMode::Daily);
    }
}

impl Routine for TitlePhase {
    const NAME: &'static str = "title";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        session.wave = 0;
        session.party = Party::default();
        session.inventory = Inventory::default();
        session.rewards = None;
        session.summary = None;
        self.stage = TitleStage::Menu;
        let gate = session.present(queue, Effect::prompt("title.menu", &["new_game", "daily_run"]))?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        match self.stage {
            TitleStage::Menu => match outcome.choice() {
                Some(DAILY_RUN) => {
                    self.stage = TitleStage::DailySeed;
                    Ok(Step::Await(session.present(queue, Effect::DailySeed)?))
                }
                choice => {
                    if choice != Some(NEW_GAME) {
                        warn!(?outcome, "Unexpected title answer, starting a new game");
                    }
                    session.mode = GameMode::Classic;
                    self.chosen = Some(GameMode::Classic);
                    Ok(Step::End)
                }
            },
            TitleStage::DailySeed => {
                let seed = match outcome {
                    GateOutcome::Resolved(GateValue::Data(serde_json::Value::String(seed)))
                        if !seed.is_empty() =>
                    {
                        RunSeed::new(seed)
                    }
                    other => {
                        warn!(outcome = ?other, today = %session.today, "Daily seed unavailable, using the local date");
                        RunSeed::daily(session.today)
                    }
                };
                self.begin_daily(session, seed);
                Ok(Step::End)
            }
        }
    }

    fn end(&mut self, _session: &mut Session, queue: &mut GameQueue<'_>) -> Result<(), PhaseError> {
        match self.chosen {
            Some(GameMode::Classic) => {
                queue.push(GamePhase::select_starter());
                queue.push(GamePhase::new_wave());
            }
            Some(GameMode::Daily) => {
                queue.push(GamePhase::new_wave());
            }
            None => {}
        }
        Ok(())
    }
}

/// Lets the player assemble a party. Cancelling returns to the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectStarterPhase;

fn parse_starters(value: &GateValue) -> Option<Vec<Species>> {
    let GateValue::Data(serde_json::Value::Array(names)) = value else {
        return None;
    };
    let species: Option<Vec<Species>> = names
        .iter()
        .map(|name| name.as_str().and_then(Species::from_name))
        .collect();
    species.filter(|list| !list.is_empty() && list.len() <= MAX_PARTY)
}

impl Routine for SelectStarterPhase {
    const NAME: &'static str = "select_starter";

    fn start(&mut self, session: &mut Session, queue: &mut GameQueue<'_>) -> Result<Step, PhaseError> {
        let gate = session.present(queue, Effect::StarterSelect { slots: MAX_PARTY })?;
        Ok(Step::Await(gate))
    }

    fn resume(
        &mut self,
        session: &mut Session,
        queue: &mut GameQueue<'_>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        let starters = match &outcome {
            GateOutcome::Resolved(value) => parse_starters(value),
            GateOutcome::Rejected(_) => None,
        };
        match starters {
            Some(species) => {
                let level = session.rules.starting_level;
                session.party = Party::new(species.into_iter().map(|s| Member::new(s, level)));
                info!(party_size = session.party.len(), "Starters selected");
            }
            None => {
                info!("Starter selection cancelled, returning to title");
                queue.clear();
                queue.push(GamePhase::title());
            }
        }
        Ok(Step::End)
    }
}
