//! Game flow
//!
//! The concrete phases of a run, the session they share and the host driver that feeds
//! presentation answers back into the scheduler.

pub mod autopilot;
pub mod effects;
pub mod party;
pub mod phases;
pub mod rewards;
pub mod rules;
pub mod run;
pub mod session;

pub use autopilot::{Answer, Autopilot, ChestPolicy, TranscriptEntry};
pub use effects::{Effect, EffectRequest};
pub use party::{Member, Party, Species};
pub use phases::GamePhase;
pub use rewards::{ChestOutcome, Inventory, RewardPlan, RewardTier};
pub use rules::RunConfig;
pub use run::{GameRun, RunOptions};
pub use session::{GameMode, RunOutcome, RunSummary, Session, SessionSnapshot};
