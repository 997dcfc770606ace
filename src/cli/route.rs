//! CLI route: single route table and run context. Dispatches to the run driver and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_chest_table, format_simulation_json, format_simulation_text};
use crate::config::{ConfigLoader, TurnstileConfig};
use crate::error::{ConfigError, RunError};
use crate::game::autopilot::{Autopilot, ChestPolicy, TranscriptEntry};
use crate::game::party::{Species, MAX_PARTY};
use crate::game::run::{GameRun, RunOptions};
use crate::game::session::RunSummary;
use crate::outcome::WeightedTable;
use crate::rng::{RunSeed, SeededRng};
use crate::scheduler::SchedulerStats;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of a simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed the run ended on (the daily seed for daily runs).
    pub seed: String,
    pub fingerprint: String,
    pub transcript: Vec<TranscriptEntry>,
    pub summary: RunSummary,
    pub stats: SchedulerStats,
}

/// Runtime context for CLI execution: workspace root and its merged configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: TurnstileConfig,
}

impl RunContext {
    /// Load configuration for `workspace_root`. `config_path` replaces the global config file.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new();
        if config_path.is_some() {
            loader = loader.with_global_file(config_path);
        }
        let config = loader.load_validated(&workspace_root)?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    /// Build from an already loaded configuration.
    pub fn with_config(workspace_root: PathBuf, config: TurnstileConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &TurnstileConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, RunError> {
        match command {
            Commands::Simulate {
                seed,
                daily,
                date,
                waves,
                chest,
                starters,
                format,
                summary_only,
            } => {
                let request = SimulateRequest {
                    seed: seed.clone(),
                    daily: *daily,
                    date: *date,
                    waves: *waves,
                    chest: *chest,
                    starters: starters.clone(),
                };
                let report = self.simulate(&request)?;
                match format {
                    OutputFormat::Text => Ok(format_simulation_text(&report, *summary_only)),
                    OutputFormat::Json => Ok(format_simulation_json(&report, *summary_only)?),
                }
            }
            Commands::Table { format } => {
                let table = WeightedTable::new(self.config.run.chest.table())?;
                Ok(format_chest_table(&table, *format == OutputFormat::Json))
            }
            Commands::Config => Ok(self.config.to_toml()?),
        }
    }

    /// Play one run headlessly with the autopilot.
    pub fn simulate(&self, request: &SimulateRequest) -> Result<SimulationReport, RunError> {
        let started = Instant::now();
        let mut rules = self.config.run.clone();
        if let Some(waves) = request.waves {
            rules.max_waves = waves;
        }
        rules.validate().map_err(ConfigError::Invalid)?;

        let today = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let options = RunOptions {
            scheduler: self.config.scheduler.clone(),
            rules,
            today,
        };

        let mut autopilot = Autopilot {
            title_choice: usize::from(request.daily),
            chest: request.chest,
            ..Autopilot::default()
        };
        if !request.starters.is_empty() {
            autopilot.starters = parse_starter_names(&request.starters)?;
        }

        let seed = RunSeed::new(request.seed.clone());
        info!(
            workspace = %self.workspace_root.display(),
            seed_fingerprint = %seed.fingerprint(),
            daily = request.daily,
            "Simulating run"
        );

        let mut run = GameRun::new(options, SeededRng::new(seed))?;
        run.start()?;
        let transcript = autopilot.drive(&mut run)?;

        let summary = run
            .session()
            .summary
            .clone()
            .ok_or_else(|| RunError::Stalled {
                steps: transcript.len(),
                reason: "run finished without a summary".to_string(),
            })?;
        let fingerprint = RunSeed::new(summary.seed.clone()).fingerprint();

        info!(
            steps = transcript.len(),
            wave = summary.wave,
            outcome = ?summary.outcome,
            duration_ms = started.elapsed().as_millis() as u64,
            "Simulation finished"
        );

        Ok(SimulationReport {
            seed: summary.seed.clone(),
            fingerprint,
            transcript,
            summary,
            stats: run.scheduler().stats().clone(),
        })
    }
}

/// Parameters of `turnstile simulate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulateRequest {
    pub seed: String,
    pub daily: bool,
    pub date: Option<NaiveDate>,
    pub waves: Option<u32>,
    pub chest: ChestPolicy,
    pub starters: Vec<String>,
}

fn parse_starter_names(names: &[String]) -> Result<Vec<Species>, RunError> {
    if names.len() > MAX_PARTY {
        return Err(RunError::InvalidArgument(format!(
            "at most {} starters allowed, got {}",
            MAX_PARTY,
            names.len()
        )));
    }
    names
        .iter()
        .map(|name| {
            Species::from_name(name.trim())
                .ok_or_else(|| RunError::InvalidArgument(format!("unknown species: {}", name)))
        })
        .collect()
}
