//! Error types for the turnstile phase scheduler.

use crate::gate::GateId;
use crate::phase::PhaseId;
use thiserror::Error;

/// Weighted outcome table errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Outcome table has no entries")]
    Empty,

    #[error("Outcome table weights sum to zero")]
    ZeroTotal,

    #[error("Outcome table weights overflow u32")]
    WeightOverflow,

    #[error("Draw {roll} is outside [0, {total})")]
    OutOfRange { roll: u32, total: u32 },
}

/// Gate contract errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Unknown gate: {0}")]
    Unknown(GateId),

    #[error("Gate {0} was already settled")]
    AlreadySettled(GateId),

    #[error("Gate {gate} is not owned by phase {phase}")]
    NotOwned { gate: GateId, phase: PhaseId },

    #[error("Gate {0} belongs to a discarded generation")]
    Stale(GateId),

    #[error("Gates opened outside a phase routine must be detached")]
    NoOwner,
}

/// Failure raised by a phase routine. Always a programming error, never a domain outcome.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Outcome table error: {0}")]
    Table(#[from] TableError),

    #[error("Phase contract violated: {0}")]
    Contract(String),
}

/// Scheduler contract violations surfaced to the host.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Phase {id} ({name}) is still in progress")]
    PhaseInProgress { id: PhaseId, name: &'static str },

    #[error("Phase {0} has already ended")]
    AlreadyEnded(PhaseId),

    #[error("Phase {0} has not started")]
    NotStarted(PhaseId),

    #[error("Unknown phase: {0}")]
    UnknownPhase(PhaseId),

    #[error("Gate {gate} resumes phase {owner}, which is not suspended on it")]
    OrphanedGate { gate: GateId, owner: PhaseId },

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Phase {id} ({name}) failed: {source}")]
    PhaseFailed {
        id: PhaseId,
        name: &'static str,
        #[source]
        source: PhaseError,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Host-level run errors
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Outcome table error: {0}")]
    Table(#[from] TableError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("Run stalled after {steps} steps: {reason}")]
    Stalled { steps: usize, reason: String },

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
