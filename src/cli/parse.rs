//! CLI parse: clap types for turnstile. No behavior; definitions only.

use crate::game::autopilot::ChestPolicy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// turnstile - seeded, phase-scheduled roguelike runs
#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Simulate seeded runs driven by a cooperative phase scheduler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where turnstile.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file used in place of the global config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a whole run headlessly and print its transcript
    Simulate {
        /// Run seed
        #[arg(long, default_value = "turnstile")]
        seed: String,
        /// Play the daily run instead (seed derived from --date)
        #[arg(long)]
        daily: bool,
        /// Date of the daily run (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Override run.max_waves
        #[arg(long)]
        waves: Option<u32>,
        /// What to do with chests
        #[arg(long, value_enum, default_value = "open")]
        chest: ChestPolicy,
        /// Starter species, comma separated
        #[arg(long, value_delimiter = ',')]
        starters: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Print only the summary
        #[arg(long)]
        summary_only: bool,
    },
    /// Show the chest outcome table and its draw intervals
    Table {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the effective configuration as TOML
    Config,
}
