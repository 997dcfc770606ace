//! Scheduler journal and counters.
//!
//! The journal is an append-only record of lifecycle transitions. Two runs with the same seed
//! and the same external answers produce identical journals.

use crate::gate::{GateId, Generation};
use crate::phase::PhaseId;
use serde::{Deserialize, Serialize};

/// Where an enqueued phase landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Tail,
    Head,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerEvent {
    Enqueued {
        phase: PhaseId,
        name: String,
        placement: Placement,
    },
    Started {
        phase: PhaseId,
        name: String,
    },
    Skipped {
        phase: PhaseId,
        name: String,
    },
    Suspended {
        phase: PhaseId,
        gate: GateId,
    },
    Resumed {
        phase: PhaseId,
        gate: GateId,
        rejected: bool,
    },
    Ended {
        phase: PhaseId,
        name: String,
    },
    Cleared {
        generation: Generation,
        discarded: usize,
        cancelled_gates: usize,
    },
    GateIgnored {
        gate: GateId,
    },
    Halted {
        phase: PhaseId,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    enabled: bool,
    events: Vec<SchedulerEvent>,
}

impl Journal {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, event: SchedulerEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    /// Names of phases in the order they started.
    pub fn started_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SchedulerEvent::Started { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn take(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Phases whose start routine ran
    pub started: usize,
    /// Phases that reached ENDED after starting
    pub ended: usize,
    /// Phases dropped by a failed `validate`
    pub skipped: usize,
    /// Phases thrown away by `clear()` without running
    pub discarded: usize,
    /// Number of `clear()` calls
    pub clears: usize,
    pub gates_opened: usize,
    /// Resolve/reject calls that hit a cancelled or stale gate
    pub gates_ignored: usize,
}
