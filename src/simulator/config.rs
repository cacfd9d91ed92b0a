//! Simulation configuration.

use crate::core::config::{DeathConfig, KillXpConfig};
use crate::core::constants::{DEFAULT_BASE_XP, DEFAULT_EXPONENT, DEFAULT_MAX_LEVEL};
use crate::formula::FormulaDescriptor;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of simulated actors
    pub num_actors: u32,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Kills each actor makes before the run ends
    pub kills_per_actor: u32,

    /// Chance (0.0 - 1.0) of dying after each kill
    pub death_chance: f64,

    /// Max health range of generic victims (inclusive)
    pub victim_health: (u32, u32),

    pub formula: FormulaDescriptor,
    pub kill_xp: KillXpConfig,
    pub death: DeathConfig,

    /// Log verbosity (0 = silent, 1 = summary, 2 = per actor)
    pub verbosity: u8,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_actors: 100,
            seed: None,
            kills_per_actor: 2_000,
            death_chance: 0.01,
            victim_health: (20, 400),
            formula: FormulaDescriptor::Exponential {
                base_xp: DEFAULT_BASE_XP,
                exponent: DEFAULT_EXPONENT,
                max_level: DEFAULT_MAX_LEVEL,
            },
            kill_xp: KillXpConfig::default(),
            death: DeathConfig {
                enable_xp_loss_on_death: true,
                ..DeathConfig::default()
            },
            verbosity: 1,
        }
    }
}

impl SimConfig {
    /// Small run for a quick look at the curve
    pub fn quick() -> Self {
        Self {
            num_actors: 20,
            kills_per_actor: 500,
            ..Default::default()
        }
    }

    /// Deaths remove a share of total XP and may drop levels
    pub fn hardcore() -> Self {
        Self {
            death_chance: 0.05,
            death: DeathConfig {
                enable_xp_loss_on_death: true,
                enable_level_down_on_death: true,
                xp_loss_percentage: 0.2,
                ..DeathConfig::default()
            },
            ..Default::default()
        }
    }

    /// Same run on a linear curve
    pub fn linear(xp_per_level: u64) -> Self {
        Self {
            formula: FormulaDescriptor::Linear {
                xp_per_level,
                max_level: DEFAULT_MAX_LEVEL,
            },
            ..Default::default()
        }
    }
}
