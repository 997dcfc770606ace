//! Queue state and the restricted handle phases use to touch it.

use crate::error::GateError;
use crate::gate::{Continuation, GateHandle, GateOutcome, GateRegistry, Generation};
use crate::phase::{Phase, PhaseId};
use crate::scheduler::journal::{Journal, Placement, SchedulerEvent, SchedulerStats};
use std::collections::VecDeque;
use tracing::{debug, info};

pub(crate) struct Queued<P> {
    pub id: PhaseId,
    pub phase: P,
}

/// Everything the scheduler mutates on behalf of a phase.
pub(crate) struct QueueState<P: Phase> {
    pub queue: VecDeque<Queued<P>>,
    pub gates: GateRegistry<P>,
    pub generation: Generation,
    pub journal: Journal,
    pub stats: SchedulerStats,
    next_phase_id: u64,
}

impl<P: Phase> QueueState<P> {
    pub fn new(journal: Journal) -> Self {
        Self {
            queue: VecDeque::new(),
            gates: GateRegistry::new(),
            generation: Generation::default(),
            journal,
            stats: SchedulerStats::default(),
            next_phase_id: 1,
        }
    }

    pub fn enqueue(&mut self, phase: P, placement: Placement) -> PhaseId {
        let id = PhaseId(self.next_phase_id);
        self.next_phase_id += 1;
        let name = phase.name();
        match placement {
            Placement::Tail => self.queue.push_back(Queued { id, phase }),
            Placement::Head => self.queue.push_front(Queued { id, phase }),
        }
        debug!(
            phase_id = %id,
            phase = name,
            placement = ?placement,
            queue_len = self.queue.len(),
            "Enqueued phase"
        );
        self.journal.record(SchedulerEvent::Enqueued {
            phase: id,
            name: name.to_string(),
            placement,
        });
        id
    }

    /// Drop all queued phases, move to a new generation, cancel the old generation's gates.
    pub fn clear(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        let cancelled_gates = self.gates.cancel_generation();
        self.generation = self.generation.next();
        self.stats.clears += 1;
        self.stats.discarded += discarded;
        info!(
            generation = %self.generation,
            discarded,
            cancelled_gates,
            "Cleared phase queue"
        );
        self.journal.record(SchedulerEvent::Cleared {
            generation: self.generation,
            discarded,
            cancelled_gates,
        });
        discarded
    }

    pub fn open_gate(&mut self, owner: Option<PhaseId>, continuation: Continuation<P>) -> GateHandle {
        let handle = self.gates.open(self.generation, owner, continuation);
        self.stats.gates_opened += 1;
        debug!(
            gate_id = %handle.id(),
            generation = %handle.generation(),
            owner = ?owner,
            "Opened gate"
        );
        handle
    }
}

/// The only view of the queue a phase routine gets: push, unshift, clear and gates.
pub struct QueueHandle<'a, P: Phase> {
    state: &'a mut QueueState<P>,
    owner: Option<PhaseId>,
}

impl<'a, P: Phase> QueueHandle<'a, P> {
    pub(crate) fn new(state: &'a mut QueueState<P>, owner: Option<PhaseId>) -> Self {
        Self { state, owner }
    }

    /// Append behind everything already queued.
    pub fn push(&mut self, phase: P) -> PhaseId {
        self.state.enqueue(phase, Placement::Tail)
    }

    /// Make `phase` the next one to run.
    pub fn unshift(&mut self, phase: P) -> PhaseId {
        self.state.enqueue(phase, Placement::Head)
    }

    /// Hard reset: discard every queued phase and cancel every open gate.
    ///
    /// The calling phase keeps running; whatever it pushes afterwards runs next.
    pub fn clear(&mut self) -> usize {
        self.state.clear()
    }

    /// Open a gate the calling phase will suspend on via `Step::Await`.
    pub fn open_gate(&mut self) -> Result<GateHandle, GateError> {
        let owner = self.owner.ok_or(GateError::NoOwner)?;
        Ok(self
            .state
            .open_gate(Some(owner), Continuation::Resume(owner)))
    }

    /// Open a gate whose continuation is `on_settle` rather than the calling phase.
    pub fn open_detached<F>(&mut self, on_settle: F) -> GateHandle
    where
        F: for<'q> FnOnce(&mut P::Context, &mut QueueHandle<'q, P>, GateOutcome) + 'static,
    {
        self.state
            .open_gate(self.owner, Continuation::Detached(Box::new(on_settle)))
    }

    /// Phase whose routine holds this handle, if any.
    pub fn owner(&self) -> Option<PhaseId> {
        self.owner
    }

    pub fn generation(&self) -> Generation {
        self.state.generation
    }

    pub fn len(&self) -> usize {
        self.state.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.queue.is_empty()
    }
}
