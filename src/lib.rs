//! Turnstile: Cooperative Phase Scheduling for Seeded Runs
//!
//! A single-threaded scheduler that runs game phases one at a time, suspends them on
//! externally settled gates, and selects random branches from weighted tables driven by a
//! reproducible random stream. The `game` module builds a roguelike run on top of it.

pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod gate;
pub mod logging;
pub mod outcome;
pub mod phase;
pub mod rng;
pub mod scheduler;
