//! AsyncGate
//!
//! One-shot bridge between scheduler-driven logic and an externally signalled completion.
//! A gate is bound to the queue generation that was current when it opened; `clear()` moves
//! the queue to a new generation and every gate of the old one becomes inert.

use crate::error::GateError;
use crate::phase::{Phase, PhaseId};
use crate::scheduler::QueueHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Gate identity. Unique for the lifetime of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u64);

impl GateId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Queue epoch. Bumped by every `clear()`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Handle given to the presentation layer; passed back to settle the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GateHandle {
    id: GateId,
    generation: Generation,
}

impl GateHandle {
    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Value carried by a resolved gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateValue {
    /// Effect finished (animation done, text dismissed).
    Ack,
    /// Index of the option the player picked.
    Choice(usize),
    /// Yes/no answer.
    Confirm(bool),
    /// Structured payload from an external service.
    Data(serde_json::Value),
}

/// Failure reported by the external collaborator that owned the effect.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{0}")]
pub struct ExternalFailure(pub String);

/// What a continuation receives.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Resolved(GateValue),
    Rejected(ExternalFailure),
}

impl GateOutcome {
    pub fn choice(&self) -> Option<usize> {
        match self {
            GateOutcome::Resolved(GateValue::Choice(index)) => Some(*index),
            _ => None,
        }
    }

    pub fn confirmed(&self) -> Option<bool> {
        match self {
            GateOutcome::Resolved(GateValue::Confirm(answer)) => Some(*answer),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, GateOutcome::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    Open,
    Resolved,
    Rejected,
    Cancelled,
}

/// Callback run when a detached gate settles.
pub type DetachedFn<P> =
    Box<dyn for<'q> FnOnce(&mut <P as Phase>::Context, &mut QueueHandle<'q, P>, GateOutcome)>;

pub(crate) enum Continuation<P: Phase> {
    /// Resume the owning phase, which is suspended on this gate.
    Resume(PhaseId),
    Detached(DetachedFn<P>),
}

pub(crate) enum Settlement<P: Phase> {
    /// Cancelled or stale; the continuation must not run.
    Ignored,
    Run(Continuation<P>),
}

struct GateRecord<P: Phase> {
    owner: Option<PhaseId>,
    state: GateState,
    continuation: Option<Continuation<P>>,
}

/// Gates of the current generation. Records of older generations are dropped on `clear()`;
/// a handle from an older generation is recognised by its generation stamp alone.
pub(crate) struct GateRegistry<P: Phase> {
    next_id: u64,
    records: HashMap<GateId, GateRecord<P>>,
}

impl<P: Phase> Default for GateRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Phase> GateRegistry<P> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            records: HashMap::new(),
        }
    }

    pub fn open(
        &mut self,
        generation: Generation,
        owner: Option<PhaseId>,
        continuation: Continuation<P>,
    ) -> GateHandle {
        let id = GateId(self.next_id);
        self.next_id += 1;
        self.records.insert(
            id,
            GateRecord {
                owner,
                state: GateState::Open,
                continuation: Some(continuation),
            },
        );
        GateHandle { id, generation }
    }

    /// Settle `handle`, handing back its continuation if it is still live.
    pub fn settle(
        &mut self,
        handle: GateHandle,
        current: Generation,
        settled_as: GateState,
    ) -> Result<Settlement<P>, GateError> {
        if handle.generation != current {
            return Ok(Settlement::Ignored);
        }
        let record = self
            .records
            .get_mut(&handle.id)
            .ok_or(GateError::Unknown(handle.id))?;
        match record.state {
            GateState::Cancelled => Ok(Settlement::Ignored),
            GateState::Resolved | GateState::Rejected => Err(GateError::AlreadySettled(handle.id)),
            GateState::Open => {
                record.state = settled_as;
                let continuation = record
                    .continuation
                    .take()
                    .ok_or(GateError::AlreadySettled(handle.id))?;
                Ok(Settlement::Run(continuation))
            }
        }
    }

    /// Check that `owner` may suspend on `handle`.
    pub fn check_awaitable(
        &self,
        handle: GateHandle,
        owner: PhaseId,
        current: Generation,
    ) -> Result<(), GateError> {
        if handle.generation != current {
            return Err(GateError::Stale(handle.id));
        }
        let record = self
            .records
            .get(&handle.id)
            .ok_or(GateError::Unknown(handle.id))?;
        if record.state != GateState::Open {
            return Err(GateError::AlreadySettled(handle.id));
        }
        match record.continuation {
            Some(Continuation::Resume(id)) if id == owner => Ok(()),
            _ => Err(GateError::NotOwned {
                gate: handle.id,
                phase: owner,
            }),
        }
    }

    /// Phase a live resume gate of the current generation would wake, if any.
    pub fn resume_target(&self, handle: GateHandle, current: Generation) -> Option<PhaseId> {
        if handle.generation != current {
            return None;
        }
        let record = self.records.get(&handle.id)?;
        match (record.state, &record.continuation) {
            (GateState::Open, Some(Continuation::Resume(owner))) => Some(*owner),
            _ => None,
        }
    }

    /// Cancel every open resume gate owned by `owner`.
    pub fn cancel_owned(&mut self, owner: PhaseId) -> usize {
        let mut cancelled = 0;
        for (id, record) in self.records.iter_mut() {
            let resumes_owner =
                matches!(record.continuation, Some(Continuation::Resume(phase)) if phase == owner);
            if record.state == GateState::Open && resumes_owner {
                record.state = GateState::Cancelled;
                record.continuation = None;
                cancelled += 1;
                debug!(gate_id = %id, phase_id = %owner, "Cancelled gate of ended phase");
            }
        }
        cancelled
    }

    /// Cancel everything of the generation being discarded. Returns how many were still open.
    pub fn cancel_generation(&mut self) -> usize {
        let open = self
            .records
            .values()
            .filter(|record| record.state == GateState::Open)
            .count();
        self.records.clear();
        open
    }

    pub fn state(&self, handle: GateHandle, current: Generation) -> Option<GateState> {
        if handle.generation != current {
            return Some(GateState::Cancelled);
        }
        self.records.get(&handle.id).map(|record| record.state)
    }

    pub fn owner(&self, id: GateId) -> Option<PhaseId> {
        self.records.get(&id).and_then(|record| record.owner)
    }

    pub fn open_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.state == GateState::Open)
            .count()
    }
}
