//! Serializable description of the active formula.

use super::curve::LevelFormula;
use crate::core::config::FormulaConfig;
use crate::core::error::{LevelingError, Result};
use crate::tables;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Formula parameters as configured. Stamped into the store so a later start
/// can tell whether the curve changed and rebuild the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaDescriptor {
    Exponential {
        base_xp: f64,
        exponent: f64,
        max_level: u32,
    },
    Linear {
        xp_per_level: u64,
        max_level: u32,
    },
    Table {
        xp_by_level: Vec<u64>,
    },
    Custom {
        expression: String,
        constants: BTreeMap<String, f64>,
        max_level: u32,
    },
}

impl FormulaDescriptor {
    /// Validate and construct the formula.
    pub fn build(&self) -> Result<LevelFormula> {
        match self {
            FormulaDescriptor::Exponential {
                base_xp,
                exponent,
                max_level,
            } => LevelFormula::exponential(*base_xp, *exponent, *max_level),
            FormulaDescriptor::Linear {
                xp_per_level,
                max_level,
            } => LevelFormula::linear(*xp_per_level, *max_level),
            FormulaDescriptor::Table { xp_by_level } => LevelFormula::table(xp_by_level.clone()),
            FormulaDescriptor::Custom {
                expression,
                constants,
                max_level,
            } => LevelFormula::custom(expression, constants.clone(), *max_level),
        }
    }

    /// SHA-256 over the canonical JSON form. Equal descriptors always produce
    /// the same fingerprint (constants are kept in a sorted map).
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)
            .map_err(|e| LevelingError::config(format!("cannot encode formula: {}", e)))?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Resolve the `[formula]` section. Table formulas read their CSV from
    /// `data_dir`, creating a default file when it is missing.
    pub fn from_config(config: &FormulaConfig, data_dir: &Path) -> Result<Self> {
        match config.kind.trim().to_ascii_lowercase().as_str() {
            "exponential" => Ok(FormulaDescriptor::Exponential {
                base_xp: config.exponential.base_xp,
                exponent: config.exponential.exponent,
                max_level: max_level_from(config.exponential.max_level)?,
            }),
            "linear" => Ok(FormulaDescriptor::Linear {
                xp_per_level: config.linear.xp_per_level,
                max_level: max_level_from(config.linear.max_level)?,
            }),
            "table" => Ok(FormulaDescriptor::Table {
                xp_by_level: tables::load_level_table(&data_dir.join(&config.table.file))?,
            }),
            "custom" => Ok(FormulaDescriptor::Custom {
                expression: config.custom.xp_for_level.clone(),
                constants: config.custom.constants.clone(),
                max_level: max_level_from(config.custom.max_level)?,
            }),
            other => Err(LevelingError::config(format!(
                "unknown formula type `{}` (expected exponential, linear, table or custom)",
                other
            ))),
        }
    }
}

fn max_level_from(value: i64) -> Result<u32> {
    if value < 1 || value > u32::MAX as i64 {
        return Err(LevelingError::config(format!(
            "max_level must be between 1 and {} (got {})",
            u32::MAX,
            value
        )));
    }
    Ok(value as u32)
}
