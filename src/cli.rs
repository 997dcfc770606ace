//! CLI domain: parse, route and presentation only.
//! No game logic; the route table dispatches to the run driver.

mod parse;
mod presentation;
mod route;

pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{format_chest_table, format_simulation_json, format_simulation_text};
pub use route::{RunContext, SimulateRequest, SimulationReport};
