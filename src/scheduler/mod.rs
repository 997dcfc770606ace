//! Phase Queue / Scheduler
//!
//! Owns the ordered phase sequence and drives it one phase at a time. At most one phase is
//! current (RUNNING or SUSPENDED). Ending a phase advances to the next head in the same call,
//! through an iterative drive loop, unless the phase's end routine cleared the queue.

mod handle;
pub mod journal;

pub use handle::QueueHandle;
pub use journal::{Journal, Placement, SchedulerEvent, SchedulerStats};

use crate::error::{PhaseError, SchedulerError};
use crate::gate::{
    Continuation, ExternalFailure, GateHandle, GateId, GateOutcome, GateState, GateValue,
    Generation, Settlement,
};
use crate::phase::{Phase, PhaseId, PhaseState, Step};
use handle::{QueueState, Queued};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, error, info, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Record lifecycle events in the journal
    #[serde(default = "default_journal")]
    pub journal: bool,
    /// How many ended phase ids are remembered for double-end detection
    #[serde(default = "default_ended_history")]
    pub ended_history: usize,
}

fn default_journal() -> bool {
    true
}

fn default_ended_history() -> usize {
    1024
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            journal: default_journal(),
            ended_history: default_ended_history(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ended_history == 0 {
            return Err("ended_history must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Where the scheduler stopped after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing current, nothing queued.
    Idle,
    /// `phase` waits on `gate`.
    Suspended { phase: PhaseId, gate: GateId },
    /// The end routine of `after` cleared the queue; the host decides when to advance again.
    Halted { after: PhaseId },
}

/// Result of settling a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Cancelled or stale gate; nothing ran.
    Ignored,
    /// The owning phase resumed; the scheduler then ran until it stopped here.
    Resumed(Progress),
    /// A detached continuation ran.
    Detached,
}

/// Read-only view of the current phase.
#[derive(Debug, Clone, Copy)]
pub struct CurrentPhase<'a, P> {
    pub id: PhaseId,
    pub phase: &'a P,
    pub state: PhaseState,
    pub awaiting: Option<GateHandle>,
    pub faulted: bool,
}

struct Running<P> {
    id: PhaseId,
    phase: P,
    state: PhaseState,
    awaiting: Option<GateHandle>,
    faulted: bool,
}

impl<P> Running<P> {
    fn new(id: PhaseId, phase: P) -> Self {
        Self {
            id,
            phase,
            state: PhaseState::Running,
            awaiting: None,
            faulted: false,
        }
    }
}

enum Settled {
    Continue,
    Suspended(Progress),
    Halted,
}

/// Bounded memory of ended phase ids.
struct EndedLedger {
    order: VecDeque<PhaseId>,
    ids: HashSet<PhaseId>,
    capacity: usize,
}

impl EndedLedger {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            ids: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    fn record(&mut self, id: PhaseId) {
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.ids.insert(id);
    }

    fn contains(&self, id: PhaseId) -> bool {
        self.ids.contains(&id)
    }
}

/// Single-threaded cooperative phase scheduler.
pub struct Scheduler<P: Phase> {
    state: QueueState<P>,
    current: Option<Running<P>>,
    ended: EndedLedger,
    config: SchedulerConfig,
}

impl<P: Phase> Default for Scheduler<P> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<P: Phase> Scheduler<P> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            state: QueueState::new(Journal::new(config.journal)),
            current: None,
            ended: EndedLedger::new(config.ended_history),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Append to the tail.
    pub fn push(&mut self, phase: P) -> PhaseId {
        self.state.enqueue(phase, Placement::Tail)
    }

    /// Prepend to the head.
    pub fn unshift(&mut self, phase: P) -> PhaseId {
        self.state.enqueue(phase, Placement::Head)
    }

    /// Host-level hard reset.
    ///
    /// Besides the queued phases, a suspended or faulted current phase is dropped too: its
    /// gate belongs to the discarded generation, so it could never resume.
    pub fn clear(&mut self) -> usize {
        let mut discarded = 0;
        if let Some(running) = self.current.take() {
            warn!(
                phase_id = %running.id,
                phase = running.phase.name(),
                state = ?running.state,
                "Discarding current phase on reset"
            );
            self.state.stats.discarded += 1;
            discarded += 1;
        }
        discarded + self.state.clear()
    }

    /// Pop the head and run it, continuing until a phase suspends or the queue drains.
    pub fn advance(&mut self, ctx: &mut P::Context) -> Result<Progress, SchedulerError> {
        if let Some(running) = &self.current {
            return Err(SchedulerError::PhaseInProgress {
                id: running.id,
                name: running.phase.name(),
            });
        }
        self.drive(ctx)
    }

    /// End the current phase `id` and advance.
    pub fn end(&mut self, id: PhaseId, ctx: &mut P::Context) -> Result<Progress, SchedulerError> {
        match self.current.take() {
            Some(running) if running.id == id => match self.retire(running, ctx)? {
                Settled::Continue => self.drive(ctx),
                Settled::Suspended(progress) => Ok(progress),
                Settled::Halted => Ok(Progress::Halted { after: id }),
            },
            other => {
                self.current = other;
                if self.ended.contains(id) {
                    warn!(phase_id = %id, "Rejected end of a phase that already ended");
                    Err(SchedulerError::AlreadyEnded(id))
                } else if self.state.queue.iter().any(|queued| queued.id == id) {
                    Err(SchedulerError::NotStarted(id))
                } else {
                    Err(SchedulerError::UnknownPhase(id))
                }
            }
        }
    }

    /// Resolve `gate` with `value` and run its continuation.
    pub fn resolve(
        &mut self,
        gate: GateHandle,
        value: GateValue,
        ctx: &mut P::Context,
    ) -> Result<Delivery, SchedulerError> {
        self.deliver(gate, GateOutcome::Resolved(value), ctx)
    }

    /// Reject `gate`; the continuation sees `GateOutcome::Rejected` and must fall back.
    pub fn reject(
        &mut self,
        gate: GateHandle,
        failure: ExternalFailure,
        ctx: &mut P::Context,
    ) -> Result<Delivery, SchedulerError> {
        self.deliver(gate, GateOutcome::Rejected(failure), ctx)
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    pub fn current(&self) -> Option<CurrentPhase<'_, P>> {
        self.current.as_ref().map(|running| CurrentPhase {
            id: running.id,
            phase: &running.phase,
            state: running.state,
            awaiting: running.awaiting,
            faulted: running.faulted,
        })
    }

    /// Lifecycle state of `id`, or `None` for phases that were discarded or never existed.
    pub fn status(&self, id: PhaseId) -> Option<PhaseState> {
        if let Some(running) = self.current.as_ref().filter(|running| running.id == id) {
            return Some(running.state);
        }
        if self.state.queue.iter().any(|queued| queued.id == id) {
            return Some(PhaseState::Created);
        }
        if self.ended.contains(id) {
            return Some(PhaseState::Ended);
        }
        None
    }

    /// Queued phases, head first.
    pub fn queued(&self) -> impl Iterator<Item = &P> + '_ {
        self.state.queue.iter().map(|queued| &queued.phase)
    }

    pub fn queued_ids(&self) -> Vec<PhaseId> {
        self.state.queue.iter().map(|queued| queued.id).collect()
    }

    pub fn len(&self) -> usize {
        self.state.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.queue.is_empty()
    }

    /// No current phase and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.state.queue.is_empty()
    }

    pub fn gate_state(&self, gate: GateHandle) -> Option<GateState> {
        self.state.gates.state(gate, self.state.generation)
    }

    pub fn open_gates(&self) -> usize {
        self.state.gates.open_count()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.state.stats
    }

    pub fn journal(&self) -> &Journal {
        &self.state.journal
    }

    pub fn take_journal(&mut self) -> Vec<SchedulerEvent> {
        self.state.journal.take()
    }

    fn drive(&mut self, ctx: &mut P::Context) -> Result<Progress, SchedulerError> {
        loop {
            let Some(Queued { id, phase }) = self.state.queue.pop_front() else {
                return Ok(Progress::Idle);
            };
            let name = phase.name();

            if !phase.validate(ctx) {
                debug!(phase_id = %id, phase = name, "Phase failed validation, skipping");
                self.ended.record(id);
                self.state.stats.skipped += 1;
                self.state.journal.record(SchedulerEvent::Skipped {
                    phase: id,
                    name: name.to_string(),
                });
                continue;
            }

            debug!(
                phase_id = %id,
                phase = name,
                generation = %self.state.generation,
                "Starting phase"
            );
            self.state.stats.started += 1;
            self.state.journal.record(SchedulerEvent::Started {
                phase: id,
                name: name.to_string(),
            });

            let running = Running::new(id, phase);
            match self.run_routine(running, ctx, |phase, ctx, queue| phase.start(ctx, queue))? {
                Settled::Continue => continue,
                Settled::Suspended(progress) => return Ok(progress),
                Settled::Halted => return Ok(Progress::Halted { after: id }),
            }
        }
    }

    fn run_routine<F>(
        &mut self,
        mut running: Running<P>,
        ctx: &mut P::Context,
        routine: F,
    ) -> Result<Settled, SchedulerError>
    where
        F: FnOnce(&mut P, &mut P::Context, &mut QueueHandle<'_, P>) -> Result<Step, PhaseError>,
    {
        let result = {
            let mut queue = QueueHandle::new(&mut self.state, Some(running.id));
            routine(&mut running.phase, ctx, &mut queue)
        };
        let step = match result {
            Ok(step) => step,
            Err(source) => return Err(self.fault(running, source)),
        };

        match step {
            Step::Await(gate) => {
                if let Err(err) =
                    self.state
                        .gates
                        .check_awaitable(gate, running.id, self.state.generation)
                {
                    return Err(self.fault(running, err.into()));
                }
                debug!(
                    phase_id = %running.id,
                    phase = running.phase.name(),
                    gate_id = %gate.id(),
                    "Phase suspended"
                );
                self.state.journal.record(SchedulerEvent::Suspended {
                    phase: running.id,
                    gate: gate.id(),
                });
                let progress = Progress::Suspended {
                    phase: running.id,
                    gate: gate.id(),
                };
                running.state = PhaseState::Suspended;
                running.awaiting = Some(gate);
                self.current = Some(running);
                Ok(Settled::Suspended(progress))
            }
            Step::End => self.retire(running, ctx),
        }
    }

    /// Run the end routine and mark the phase ENDED.
    fn retire(
        &mut self,
        mut running: Running<P>,
        ctx: &mut P::Context,
    ) -> Result<Settled, SchedulerError> {
        let generation = self.state.generation;
        running.state = PhaseState::Running;
        running.awaiting = None;

        let result = {
            let mut queue = QueueHandle::new(&mut self.state, Some(running.id));
            running.phase.end(ctx, &mut queue)
        };
        if let Err(source) = result {
            return Err(self.fault(running, source));
        }

        self.state.gates.cancel_owned(running.id);
        self.ended.record(running.id);
        self.state.stats.ended += 1;
        debug!(phase_id = %running.id, phase = running.phase.name(), "Phase ended");
        self.state.journal.record(SchedulerEvent::Ended {
            phase: running.id,
            name: running.phase.name().to_string(),
        });

        if self.state.generation != generation {
            info!(
                phase_id = %running.id,
                generation = %self.state.generation,
                "Queue cleared during phase end, not advancing"
            );
            self.state
                .journal
                .record(SchedulerEvent::Halted { phase: running.id });
            return Ok(Settled::Halted);
        }
        Ok(Settled::Continue)
    }

    /// Park a phase whose routine broke its contract. The queue stays stalled on it until the
    /// host ends it or clears.
    fn fault(&mut self, mut running: Running<P>, source: PhaseError) -> SchedulerError {
        let id = running.id;
        let name = running.phase.name();
        error!(phase_id = %id, phase = name, error = %source, "Phase routine failed");
        running.state = PhaseState::Running;
        running.awaiting = None;
        running.faulted = true;
        self.current = Some(running);
        SchedulerError::PhaseFailed { id, name, source }
    }

    fn deliver(
        &mut self,
        gate: GateHandle,
        outcome: GateOutcome,
        ctx: &mut P::Context,
    ) -> Result<Delivery, SchedulerError> {
        let settled_as = if outcome.is_rejected() {
            GateState::Rejected
        } else {
            GateState::Resolved
        };
        // A resume gate may only settle while its owner is parked on it; otherwise it stays open.
        if let Some(owner) = self.state.gates.resume_target(gate, self.state.generation) {
            let parked = self
                .current
                .as_ref()
                .is_some_and(|running| running.id == owner && running.awaiting == Some(gate));
            if !parked {
                warn!(gate_id = %gate.id(), phase_id = %owner, "Gate owner is not waiting on it");
                return Err(SchedulerError::OrphanedGate {
                    gate: gate.id(),
                    owner,
                });
            }
        }

        let owner = self.state.gates.owner(gate.id());
        let continuation = match self
            .state
            .gates
            .settle(gate, self.state.generation, settled_as)?
        {
            Settlement::Ignored => {
                debug!(
                    gate_id = %gate.id(),
                    gate_generation = %gate.generation(),
                    generation = %self.state.generation,
                    "Ignoring settlement of cancelled gate"
                );
                self.state.stats.gates_ignored += 1;
                self.state
                    .journal
                    .record(SchedulerEvent::GateIgnored { gate: gate.id() });
                return Ok(Delivery::Ignored);
            }
            Settlement::Run(continuation) => continuation,
        };

        match continuation {
            Continuation::Resume(owner) => {
                let mut running = match self.current.take() {
                    Some(running) if running.id == owner && running.awaiting == Some(gate) => {
                        running
                    }
                    other => {
                        self.current = other;
                        return Err(SchedulerError::OrphanedGate {
                            gate: gate.id(),
                            owner,
                        });
                    }
                };
                debug!(
                    phase_id = %owner,
                    phase = running.phase.name(),
                    gate_id = %gate.id(),
                    rejected = outcome.is_rejected(),
                    "Resuming phase"
                );
                self.state.journal.record(SchedulerEvent::Resumed {
                    phase: owner,
                    gate: gate.id(),
                    rejected: outcome.is_rejected(),
                });
                running.state = PhaseState::Running;
                running.awaiting = None;

                let settled = self.run_routine(running, ctx, move |phase, ctx, queue| {
                    phase.resume(ctx, queue, outcome)
                })?;
                let progress = match settled {
                    Settled::Continue => self.drive(ctx)?,
                    Settled::Suspended(progress) => progress,
                    Settled::Halted => Progress::Halted { after: owner },
                };
                Ok(Delivery::Resumed(progress))
            }
            Continuation::Detached(on_settle) => {
                debug!(gate_id = %gate.id(), opened_by = ?owner, "Running detached continuation");
                let mut queue = QueueHandle::new(&mut self.state, None);
                on_settle(ctx, &mut queue, outcome);
                Ok(Delivery::Detached)
            }
        }
    }
}
