//! XP <-> level conversion for every supported curve.

use super::expression::XpExpression;
use crate::core::constants::MAX_XP;
use crate::core::error::{LevelingError, Result};
use std::collections::BTreeMap;

/// The active XP curve. Built once from a [`super::FormulaDescriptor`] and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub enum LevelFormula {
    /// `ceil(base_xp * (level - 1) ^ exponent)`
    Exponential {
        base_xp: f64,
        exponent: f64,
        max_level: u32,
    },
    /// `xp_per_level * (level - 1)`
    Linear { xp_per_level: u64, max_level: u32 },
    /// Explicit floors; index 0 is unused, `xp_by_level[1]` is always 0.
    Table { xp_by_level: Vec<u64> },
    /// Evaluated from level 2 on; level 1 always costs 0.
    Custom(XpExpression),
}

impl LevelFormula {
    pub fn exponential(base_xp: f64, exponent: f64, max_level: u32) -> Result<Self> {
        if !base_xp.is_finite() || base_xp < 0.0 {
            return Err(LevelingError::config("exponential.base_xp must be >= 0"));
        }
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(LevelingError::config("exponential.exponent must be > 0"));
        }
        check_max_level(max_level)?;
        Ok(LevelFormula::Exponential {
            base_xp,
            exponent,
            max_level,
        })
    }

    pub fn linear(xp_per_level: u64, max_level: u32) -> Result<Self> {
        check_max_level(max_level)?;
        Ok(LevelFormula::Linear {
            xp_per_level,
            max_level,
        })
    }

    /// Build a table curve. Requires at least levels 0..=1, a zero cost at
    /// level 1, and non-decreasing floors from level 1 on.
    pub fn table(xp_by_level: Vec<u64>) -> Result<Self> {
        if xp_by_level.len() < 2 {
            return Err(LevelingError::config(
                "xp_by_level must include at least levels 0..1",
            ));
        }
        if xp_by_level[1] != 0 {
            return Err(LevelingError::config(format!(
                "level 1 must require 0 XP (found {})",
                xp_by_level[1]
            )));
        }
        for level in 2..xp_by_level.len() {
            if xp_by_level[level] < xp_by_level[level - 1] {
                return Err(LevelingError::config(format!(
                    "XP must be non-decreasing (level {})",
                    level
                )));
            }
        }
        if xp_by_level.len() - 1 > u32::MAX as usize {
            return Err(LevelingError::config("level table is too long"));
        }
        Ok(LevelFormula::Table { xp_by_level })
    }

    pub fn custom(expression: &str, constants: BTreeMap<String, f64>, max_level: u32) -> Result<Self> {
        Ok(LevelFormula::Custom(XpExpression::new(
            expression, constants, max_level,
        )?))
    }

    pub fn max_level(&self) -> u32 {
        match self {
            LevelFormula::Exponential { max_level, .. } => *max_level,
            LevelFormula::Linear { max_level, .. } => *max_level,
            LevelFormula::Table { xp_by_level } => (xp_by_level.len() - 1) as u32,
            LevelFormula::Custom(expression) => expression.max_level(),
        }
    }

    /// Total XP needed to be at `level`.
    pub fn xp_for_level(&self, level: u32) -> Result<u64> {
        if level < 1 {
            return Err(LevelingError::invalid_argument("level must be >= 1"));
        }

        match self {
            LevelFormula::Exponential {
                base_xp, exponent, ..
            } => {
                let steps = (level - 1) as f64;
                Ok(clamp_xp(base_xp * steps.powf(*exponent)))
            }
            LevelFormula::Linear { xp_per_level, .. } => Ok(xp_per_level
                .saturating_mul((level - 1) as u64)
                .min(MAX_XP)),
            LevelFormula::Table { xp_by_level } => {
                let index = (level as usize).min(xp_by_level.len() - 1);
                Ok(xp_by_level[index])
            }
            LevelFormula::Custom(_) if level == 1 => Ok(0),
            LevelFormula::Custom(expression) => Ok(clamp_xp(expression.evaluate(level)?)),
        }
    }

    /// Highest level whose XP floor is `<= xp`, within `[1, max_level]`.
    pub fn level_for_xp(&self, xp: u64) -> Result<u32> {
        match self {
            LevelFormula::Table { xp_by_level } => {
                let reached = xp_by_level[1..].partition_point(|&floor| floor <= xp);
                Ok((reached as u32).clamp(1, self.max_level()))
            }
            _ => self.search_level(xp),
        }
    }

    /// Upper-bound binary search over `[1, max_level]`. Assumes the curve is
    /// non-decreasing; for a custom expression that is not, the result is a
    /// best-effort level.
    fn search_level(&self, xp: u64) -> Result<u32> {
        let max_level = self.max_level();
        if xp >= self.xp_for_level(max_level)? {
            return Ok(max_level);
        }

        let mut lo = 1;
        let mut hi = max_level;
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.xp_for_level(mid)? <= xp {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        Ok(lo)
    }

    /// Short human-readable name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            LevelFormula::Exponential { .. } => "exponential",
            LevelFormula::Linear { .. } => "linear",
            LevelFormula::Table { .. } => "table",
            LevelFormula::Custom(_) => "custom",
        }
    }
}

fn check_max_level(max_level: u32) -> Result<()> {
    if max_level < 1 {
        return Err(LevelingError::config("max_level must be >= 1"));
    }
    Ok(())
}

/// Round a raw curve value up to whole XP, within `[0, MAX_XP]`.
fn clamp_xp(value: f64) -> u64 {
    if !value.is_finite() || value >= MAX_XP as f64 {
        MAX_XP
    } else if value <= 0.0 {
        0
    } else {
        value.ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_exponential() -> LevelFormula {
        LevelFormula::exponential(100.0, 1.7, 100_000).unwrap()
    }

    fn sample_table() -> LevelFormula {
        LevelFormula::table(vec![0, 0, 100, 300, 600]).unwrap()
    }

    #[test]
    fn test_exponential_first_levels() {
        let formula = default_exponential();
        assert_eq!(formula.xp_for_level(1).unwrap(), 0);
        assert_eq!(formula.xp_for_level(2).unwrap(), 100);
        // 100 * 2^1.7 = 324.9...
        assert_eq!(formula.xp_for_level(3).unwrap(), 325);
    }

    #[test]
    fn test_exponential_level_for_xp_boundaries() {
        let formula = default_exponential();
        let floor = formula.xp_for_level(4).unwrap();
        assert_eq!(formula.level_for_xp(floor).unwrap(), 4);
        assert_eq!(formula.level_for_xp(floor - 1).unwrap(), 3);
    }

    #[test]
    fn test_linear_curve() {
        let formula = LevelFormula::linear(100, 50).unwrap();
        assert_eq!(formula.xp_for_level(1).unwrap(), 0);
        assert_eq!(formula.xp_for_level(5).unwrap(), 400);
        assert_eq!(formula.level_for_xp(399).unwrap(), 4);
        assert_eq!(formula.level_for_xp(400).unwrap(), 5);
        assert_eq!(formula.level_for_xp(u64::MAX).unwrap(), 50);
    }

    #[test]
    fn test_linear_saturates() {
        let formula = LevelFormula::linear(u64::MAX, 10).unwrap();
        assert_eq!(formula.xp_for_level(3).unwrap(), MAX_XP);
    }

    #[test]
    fn test_table_lookup_scenario() {
        let formula = sample_table();
        assert_eq!(formula.max_level(), 4);
        assert_eq!(formula.level_for_xp(0).unwrap(), 1);
        assert_eq!(formula.level_for_xp(250).unwrap(), 2);
        assert_eq!(formula.level_for_xp(300).unwrap(), 3);
        assert_eq!(formula.level_for_xp(600).unwrap(), 4);
        assert_eq!(formula.level_for_xp(1000).unwrap(), 4);
    }

    #[test]
    fn test_table_xp_beyond_last_level_clamps() {
        let formula = sample_table();
        assert_eq!(formula.xp_for_level(4).unwrap(), 600);
        assert_eq!(formula.xp_for_level(9).unwrap(), 600);
    }

    #[test]
    fn test_table_equal_floors_pick_highest_level() {
        let formula = LevelFormula::table(vec![0, 0, 100, 100, 200]).unwrap();
        assert_eq!(formula.level_for_xp(100).unwrap(), 3);
    }

    #[test]
    fn test_table_validation() {
        assert!(matches!(
            LevelFormula::table(vec![0]),
            Err(LevelingError::Config(_))
        ));
        assert!(matches!(
            LevelFormula::table(vec![0, 10, 20]),
            Err(LevelingError::Config(_))
        ));
        assert!(matches!(
            LevelFormula::table(vec![0, 0, 200, 100]),
            Err(LevelingError::Config(_))
        ));
    }

    #[test]
    fn test_level_zero_is_invalid_argument() {
        let formula = default_exponential();
        assert!(matches!(
            formula.xp_for_level(0),
            Err(LevelingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(LevelFormula::exponential(100.0, 1.7, 0).is_err());
        assert!(LevelFormula::exponential(-1.0, 1.7, 10).is_err());
        assert!(LevelFormula::exponential(100.0, 0.0, 10).is_err());
        assert!(LevelFormula::exponential(f64::NAN, 1.7, 10).is_err());
        assert!(LevelFormula::linear(100, 0).is_err());
    }

    #[test]
    fn test_custom_curve_clamps_negative_to_zero() {
        let formula = LevelFormula::custom("100 * (level - 2)", BTreeMap::new(), 10).unwrap();
        assert_eq!(formula.xp_for_level(1).unwrap(), 0);
        assert_eq!(formula.xp_for_level(3).unwrap(), 100);
    }

    #[test]
    fn test_custom_curve_rounds_up() {
        let formula = LevelFormula::custom("level * 10.2", BTreeMap::new(), 10).unwrap();
        assert_eq!(formula.xp_for_level(2).unwrap(), 21);
    }

    #[test]
    fn test_custom_level_one_costs_nothing() {
        // exp(0) * 100 would be 100 XP; level 1 is pinned to 0.
        let formula = LevelFormula::custom("exp(0.1 * (level - 1)) * 100", BTreeMap::new(), 10)
            .unwrap();
        assert_eq!(formula.xp_for_level(1).unwrap(), 0);
        assert_eq!(formula.xp_for_level(2).unwrap(), 111);
        assert_eq!(formula.level_for_xp(50).unwrap(), 1);
    }

    #[test]
    fn test_custom_below_first_floor_is_level_one() {
        let formula = LevelFormula::custom("100 * level", BTreeMap::new(), 10).unwrap();
        assert_eq!(formula.level_for_xp(0).unwrap(), 1);
        assert_eq!(formula.level_for_xp(250).unwrap(), 2);
        assert_eq!(formula.level_for_xp(5_000).unwrap(), 10);
    }

    #[test]
    fn test_custom_overflow_clamps_to_max() {
        let formula = LevelFormula::custom("exp(level * 1000)", BTreeMap::new(), 10).unwrap();
        assert_eq!(formula.xp_for_level(2).unwrap(), MAX_XP);
    }

    #[test]
    fn test_clamp_xp() {
        assert_eq!(clamp_xp(-5.0), 0);
        assert_eq!(clamp_xp(0.0), 0);
        assert_eq!(clamp_xp(0.1), 1);
        assert_eq!(clamp_xp(f64::INFINITY), MAX_XP);
        assert_eq!(clamp_xp(f64::NAN), MAX_XP);
    }

    #[test]
    fn test_names() {
        assert_eq!(default_exponential().name(), "exponential");
        assert_eq!(sample_table().name(), "table");
    }
}
