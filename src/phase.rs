//! Phase Contract
//!
//! A phase is a unit of game-state change with a fixed lifecycle:
//!
//! ```text
//! CREATED --advance--> RUNNING --Await(gate)--> SUSPENDED
//!                         ^                         |
//!                         +------gate resolves------+
//! RUNNING --End--> ENDED (terminal)
//! ```
//!
//! Routines never hold on to the session context; it is passed into every call.

use crate::error::PhaseError;
use crate::gate::{GateHandle, GateOutcome};
use crate::scheduler::QueueHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity assigned to a phase when it is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhaseId(pub(crate) u64);

impl PhaseId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseState {
    Created,
    Running,
    Suspended,
    Ended,
}

/// What a routine asks the scheduler to do next.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The phase is done; end it and move on.
    End,
    /// Suspend until the gate settles, then call [`Phase::resume`].
    Await(GateHandle),
}

/// The capability contract every phase variant implements.
pub trait Phase: Sized + 'static {
    /// Session state shared by all phases, owned by the host.
    type Context;

    /// Stable kind name used in logs and journals.
    fn name(&self) -> &'static str;

    /// Evaluated once, right before `start`. Returning `false` ends the phase with no side
    /// effects.
    fn validate(&self, _ctx: &Self::Context) -> bool {
        true
    }

    fn start(
        &mut self,
        ctx: &mut Self::Context,
        queue: &mut QueueHandle<'_, Self>,
    ) -> Result<Step, PhaseError>;

    /// Continue after the gate the phase suspended on has settled.
    fn resume(
        &mut self,
        _ctx: &mut Self::Context,
        _queue: &mut QueueHandle<'_, Self>,
        _outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        Ok(Step::End)
    }

    /// Teardown, run exactly once when the phase ends.
    fn end(
        &mut self,
        _ctx: &mut Self::Context,
        _queue: &mut QueueHandle<'_, Self>,
    ) -> Result<(), PhaseError> {
        Ok(())
    }
}
