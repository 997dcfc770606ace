//! Shared test utilities for integration tests
//!
//! A small scripted phase set that records every routine call, so queue mechanics can be
//! checked without the game layer.

use turnstile::error::PhaseError;
use turnstile::gate::{GateHandle, GateOutcome};
use turnstile::phase::{Phase, Step};
use turnstile::scheduler::QueueHandle;

/// Context shared by scripted phases.
#[derive(Debug, Default)]
pub struct Trace {
    pub log: Vec<String>,
    /// Gates opened by `Wait` and `Fire`, in opening order.
    pub gates: Vec<GateHandle>,
}

impl Trace {
    /// Labels of phases whose start routine ran, in order.
    pub fn started(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|line| line.strip_prefix("start "))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    /// Starts and ends.
    Note(&'static str),
    /// Unshifts notes from its start routine so they run next, in the given order.
    Spawn(&'static str, Vec<&'static str>),
    /// Pushes notes to the tail from its start routine.
    Append(&'static str, Vec<&'static str>),
    /// Suspends on a gate and logs how it settled.
    Wait(&'static str),
    /// Opens a detached gate whose continuation pushes `Note(late)`, then ends.
    Fire(&'static str, &'static str),
    /// Clears the queue in its end routine and pushes `Note(next)`.
    ResetOnEnd(&'static str, &'static str),
    /// Fails validation.
    Skip(&'static str),
    /// Returns an error from start.
    Broken(&'static str),
}

impl Script {
    fn label(&self) -> &'static str {
        match self {
            Script::Note(label)
            | Script::Spawn(label, _)
            | Script::Append(label, _)
            | Script::Wait(label)
            | Script::Fire(label, _)
            | Script::ResetOnEnd(label, _)
            | Script::Skip(label)
            | Script::Broken(label) => *label,
        }
    }
}

impl Phase for Script {
    type Context = Trace;

    fn name(&self) -> &'static str {
        self.label()
    }

    fn validate(&self, _trace: &Trace) -> bool {
        !matches!(self, Script::Skip(_))
    }

    fn start(
        &mut self,
        trace: &mut Trace,
        queue: &mut QueueHandle<'_, Self>,
    ) -> Result<Step, PhaseError> {
        trace.log.push(format!("start {}", self.label()));
        match self {
            Script::Spawn(_, children) => {
                for child in children.iter().rev() {
                    queue.unshift(Script::Note(*child));
                }
                Ok(Step::End)
            }
            Script::Append(_, children) => {
                for child in children.iter() {
                    queue.push(Script::Note(*child));
                }
                Ok(Step::End)
            }
            Script::Wait(_) => {
                let gate = queue.open_gate()?;
                trace.gates.push(gate);
                Ok(Step::Await(gate))
            }
            Script::Fire(_, late) => {
                let late: &'static str = *late;
                let gate = queue.open_detached(move |trace, queue, outcome| {
                    trace
                        .log
                        .push(format!("detached {} rejected={}", late, outcome.is_rejected()));
                    queue.push(Script::Note(late));
                });
                trace.gates.push(gate);
                Ok(Step::End)
            }
            Script::Broken(label) => Err(PhaseError::Contract(format!("{} is broken", label))),
            _ => Ok(Step::End),
        }
    }

    fn resume(
        &mut self,
        trace: &mut Trace,
        _queue: &mut QueueHandle<'_, Self>,
        outcome: GateOutcome,
    ) -> Result<Step, PhaseError> {
        let settled = match &outcome {
            GateOutcome::Resolved(value) => format!("{:?}", value),
            GateOutcome::Rejected(failure) => format!("rejected {}", failure.0),
        };
        trace.log.push(format!("resume {} {}", self.label(), settled));
        Ok(Step::End)
    }

    fn end(&mut self, trace: &mut Trace, queue: &mut QueueHandle<'_, Self>) -> Result<(), PhaseError> {
        trace.log.push(format!("end {}", self.label()));
        if let Script::ResetOnEnd(_, next) = self {
            queue.clear();
            queue.push(Script::Note(*next));
        }
        Ok(())
    }
}
