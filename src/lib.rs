//! Leveling - XP and level progression engine
//!
//! Pluggable XP curves with formula migration, cached player progression with
//! level notifications, and periodically recomputed levels for non-player
//! actors.

pub mod core;
pub mod dynamic;
pub mod formula;
pub mod progression;
pub mod tables;
pub mod simulator;
pub mod utils;

pub use crate::core::{LevelingContext, LevelingError, Result};
