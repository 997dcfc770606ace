//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only keys other layers commonly override are seeded here; everything else falls back to
/// the serde defaults of the config structs.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("scheduler.journal", true)?
        .set_default("run.max_waves", 200_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.output", "stderr")
}
