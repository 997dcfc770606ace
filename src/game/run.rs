//! Host driver: owns the scheduler and the session, and is the only thing the presentation
//! layer talks to.

use crate::error::RunError;
use crate::game::effects::EffectRequest;
use crate::game::party::Party;
use crate::game::phases::GamePhase;
use crate::game::rules::RunConfig;
use crate::game::session::{GameMode, Session, SessionSnapshot};
use crate::gate::{ExternalFailure, GateHandle, GateValue};
use crate::rng::SessionRng;
use crate::scheduler::{Delivery, Progress, Scheduler, SchedulerConfig};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Everything needed to set up a run besides the random source.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scheduler: SchedulerConfig,
    pub rules: RunConfig,
    pub today: NaiveDate,
}

impl RunOptions {
    pub fn new(rules: RunConfig, today: NaiveDate) -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            rules,
            today,
        }
    }
}

pub struct GameRun {
    scheduler: Scheduler<GamePhase>,
    session: Session,
    progress: Progress,
}

impl GameRun {
    pub fn new(options: RunOptions, rng: impl Into<SessionRng>) -> Result<Self, RunError> {
        let session = Session::new(options.rules, rng, options.today)?;
        Ok(Self {
            scheduler: Scheduler::new(options.scheduler),
            session,
            progress: Progress::Idle,
        })
    }

    /// Continue a saved run. The queue is rebuilt from scratch and re-enters the saved wave.
    pub fn resume(options: RunOptions, snapshot: SessionSnapshot) -> Result<Self, RunError> {
        info!(
            seed_fingerprint = %snapshot.seed.fingerprint(),
            wave = snapshot.wave,
            "Resuming run"
        );
        let session = Session::restore(options.rules, snapshot, options.today)?;
        let mut run = Self {
            scheduler: Scheduler::new(options.scheduler),
            session,
            progress: Progress::Idle,
        };
        run.begin_with(vec![GamePhase::replay_wave()])?;
        Ok(run)
    }

    /// Start at the title menu.
    pub fn start(&mut self) -> Result<Progress, RunError> {
        self.begin_with(vec![GamePhase::title()])
    }

    /// Skip the menus and start a classic run with `party`.
    pub fn start_with_party(&mut self, party: Party) -> Result<Progress, RunError> {
        self.session.party = party;
        self.session.mode = GameMode::Classic;
        self.begin_with(vec![GamePhase::new_wave()])
    }

    /// Queue `phases` and drive the scheduler until it needs the host.
    pub fn begin_with(&mut self, phases: Vec<GamePhase>) -> Result<Progress, RunError> {
        for phase in phases {
            self.scheduler.push(phase);
        }
        self.pump()
    }

    /// Drain the presentation requests produced since the last call.
    pub fn take_effects(&mut self) -> Vec<EffectRequest> {
        self.session.take_effects()
    }

    pub fn resolve(&mut self, gate: GateHandle, value: GateValue) -> Result<Delivery, RunError> {
        let delivery = self.scheduler.resolve(gate, value, &mut self.session)?;
        self.after(delivery)
    }

    pub fn reject(
        &mut self,
        gate: GateHandle,
        failure: ExternalFailure,
    ) -> Result<Delivery, RunError> {
        let delivery = self.scheduler.reject(gate, failure, &mut self.session)?;
        self.after(delivery)
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, RunError> {
        self.session.snapshot()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn scheduler(&self) -> &Scheduler<GamePhase> {
        &self.scheduler
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// The run recorded its summary and nothing is left to do.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_idle() && self.session.summary.is_some()
    }

    fn after(&mut self, delivery: Delivery) -> Result<Delivery, RunError> {
        if let Delivery::Resumed(progress) = delivery {
            self.progress = progress;
        }
        self.pump()?;
        Ok(delivery)
    }

    /// Advance whenever nothing is current but phases are queued. Covers halts after a reset
    /// and phases queued by detached continuations.
    fn pump(&mut self) -> Result<Progress, RunError> {
        while self.scheduler.current().is_none() && !self.scheduler.is_empty() {
            self.progress = self.scheduler.advance(&mut self.session)?;
            debug!(progress = ?self.progress, "Scheduler stopped");
        }
        Ok(self.progress)
    }
}
