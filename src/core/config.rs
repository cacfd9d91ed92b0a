//! Engine configuration (`leveling.toml`).
//!
//! Every section and field has a default, so a partial file is valid. A missing
//! file is created with the defaults on first start.

use super::constants::*;
use super::error::{LevelingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
    pub formula: FormulaConfig,
    pub progression: ProgressionConfig,
    pub death: DeathConfig,
    pub kill_xp: KillXpConfig,
    pub mobs: MobConfig,
    pub storage: StorageConfig,
}

/// Which XP curve is active, plus the parameters of every curve type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    /// One of `exponential`, `linear`, `table`, `custom` (case-insensitive)
    #[serde(rename = "type")]
    pub kind: String,
    /// Recompute stored XP when the formula changes so players keep their level
    pub migrate_xp: bool,
    pub exponential: ExponentialConfig,
    pub linear: LinearConfig,
    pub table: TableConfig,
    pub custom: CustomConfig,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            kind: "exponential".to_string(),
            migrate_xp: true,
            exponential: ExponentialConfig::default(),
            linear: LinearConfig::default(),
            table: TableConfig::default(),
            custom: CustomConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialConfig {
    pub base_xp: f64,
    pub exponent: f64,
    pub max_level: i64,
}

impl Default for ExponentialConfig {
    fn default() -> Self {
        Self {
            base_xp: DEFAULT_BASE_XP,
            exponent: DEFAULT_EXPONENT,
            max_level: DEFAULT_MAX_LEVEL as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub xp_per_level: u64,
    pub max_level: i64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            xp_per_level: DEFAULT_XP_PER_LEVEL,
            max_level: DEFAULT_MAX_LEVEL as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// CSV file (level,xp) relative to the data directory
    pub file: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_TABLE_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    /// Expression for the XP floor of `level`
    pub xp_for_level: String,
    pub max_level: i64,
    pub constants: BTreeMap<String, f64>,
}

impl Default for CustomConfig {
    fn default() -> Self {
        let constants = [("a", 0.12), ("b", 100.0), ("c", 1.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            xp_for_level: DEFAULT_CUSTOM_EXPRESSION.to_string(),
            max_level: DEFAULT_MAX_LEVEL as i64,
            constants,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Upper bound on cached player records (least recently used evicted)
    pub cache_capacity: usize,
    /// Flat ability points granted per level
    pub stats_per_level: u32,
    /// Use `statsperlevel.csv` instead of `stats_per_level`
    pub use_stats_per_level_mapping: bool,
    pub disable_stat_point_gain_on_level_up: bool,
    pub enable_level_up_rewards: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            stats_per_level: DEFAULT_STATS_PER_LEVEL,
            use_stats_per_level_mapping: false,
            disable_stat_point_gain_on_level_up: false,
            enable_level_up_rewards: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    pub enable_xp_loss_on_death: bool,
    /// Fraction of current XP lost on death (0.0 - 1.0)
    pub xp_loss_percentage: f64,
    /// XP loss may drop the player below their current level
    pub enable_level_down_on_death: bool,
    pub enable_all_levels_lost_on_death: bool,
    /// Players below this level never lose XP on death
    pub min_level_for_level_down: u32,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            enable_xp_loss_on_death: false,
            xp_loss_percentage: DEFAULT_XP_LOSS_PERCENTAGE,
            enable_level_down_on_death: false,
            enable_all_levels_lost_on_death: false,
            min_level_for_level_down: DEFAULT_MIN_LEVEL_FOR_LEVEL_DOWN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillXpConfig {
    pub enabled: bool,
    /// Fraction of the victim's max health awarded as XP
    pub default_xp_gain_percentage: f64,
    /// Prefer `xpmapping.csv` entries over the health-based amount
    pub use_xp_mappings: bool,
}

impl Default for KillXpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_xp_gain_percentage: DEFAULT_XP_GAIN_PERCENTAGE,
            use_xp_mappings: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobConfig {
    /// SPAWN_ONLY, NEARBY_PLAYERS_MEAN, ZONE, BIOME or INSTANCE
    pub level_mode: String,
    /// Extra max health per level above 1
    pub health_multiplier: f32,
    pub recalc_interval_ms: u64,
    pub flush_interval_ms: u64,
    pub nearby_radius: f64,
}

impl Default for MobConfig {
    fn default() -> Self {
        Self {
            level_mode: "NEARBY_PLAYERS_MEAN".to_string(),
            health_multiplier: DEFAULT_MOB_HEALTH_MULTIPLIER,
            recalc_interval_ms: DEFAULT_RECALC_INTERVAL_MS,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            nearby_radius: NEARBY_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory (relative to the data directory) holding per-player JSON records
    pub players_dir: String,
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            players_dir: PLAYERS_DIR.to_string(),
            snapshot_file: SNAPSHOT_FILE.to_string(),
        }
    }
}

impl LevelingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LevelingError::config(format!("invalid config: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LevelingError::config(format!("cannot serialize config: {}", e)))
    }

    /// Load `leveling.toml` from `data_dir`, writing the defaults first if absent.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(CONFIG_FILE);

        if !path.exists() {
            info!("Creating default config at {}", path.display());
            fs::write(&path, Self::default().to_toml_string()?)?;
        }

        let text = fs::read_to_string(&path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = LevelingConfig::from_toml_str("").unwrap();
        assert_eq!(config, LevelingConfig::default());
        assert_eq!(config.formula.kind, "exponential");
        assert_eq!(config.formula.exponential.max_level, 100_000);
        assert!(config.formula.migrate_xp);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let text = r#"
            [formula]
            type = "LINEAR"

            [formula.linear]
            xp_per_level = 250
        "#;
        let config = LevelingConfig::from_toml_str(text).unwrap();
        assert_eq!(config.formula.kind, "LINEAR");
        assert_eq!(config.formula.linear.xp_per_level, 250);
        assert_eq!(config.formula.linear.max_level, 100_000);
        assert_eq!(config.mobs.recalc_interval_ms, 2_000);
    }

    #[test]
    fn test_custom_constants_parse() {
        let text = r#"
            [formula.custom]
            xp_for_level = "a * level"
            max_level = 50

            [formula.custom.constants]
            a = 12.5
        "#;
        let config = LevelingConfig::from_toml_str(text).unwrap();
        assert_eq!(config.formula.custom.constants.get("a"), Some(&12.5));
        assert_eq!(config.formula.custom.constants.len(), 1);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = LevelingConfig::from_toml_str("[formula\ntype = 3").unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let text = LevelingConfig::default().to_toml_string().unwrap();
        let parsed = LevelingConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, LevelingConfig::default());
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LevelingConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(config, LevelingConfig::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }
}
