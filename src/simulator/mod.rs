//! Progression simulator for balancing XP curves.
//!
//! Runs many seeded actors through kill rewards and death penalties on the
//! real progression service to analyze:
//! - Level reached after a fixed number of kills
//! - XP lost to death penalties
//! - Shape of the XP curve

mod config;
mod report;
mod runner;

pub use config::SimConfig;
pub use report::{RunStats, SimReport};
pub use runner::run_simulation;
