// XP storage
/// Largest XP value a record may hold. Kept at the signed 64-bit limit so any
/// backend with a BIGINT column can store it.
pub const MAX_XP: u64 = i64::MAX as u64;

// Formula defaults
pub const DEFAULT_BASE_XP: f64 = 100.0;
pub const DEFAULT_EXPONENT: f64 = 1.7;
pub const DEFAULT_XP_PER_LEVEL: u64 = 100;
pub const DEFAULT_MAX_LEVEL: u32 = 100_000;
pub const DEFAULT_CUSTOM_EXPRESSION: &str = "exp(a * (level - 1)) * b / c";
pub const DEFAULT_TABLE_FILE: &str = "levels.csv";

// Progression cache
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

// Ability points
pub const DEFAULT_STATS_PER_LEVEL: u32 = 5;
pub const MIN_ABILITY_POINT_TOTAL: u32 = 5;

// Death penalty
pub const DEFAULT_XP_LOSS_PERCENTAGE: f64 = 0.1;
pub const DEFAULT_MIN_LEVEL_FOR_LEVEL_DOWN: u32 = 65;

// Kill XP
pub const DEFAULT_XP_GAIN_PERCENTAGE: f64 = 0.5;

// Dynamic (non-player) levels
pub const SPAWN_LEVEL_MIN: u32 = 1;
pub const SPAWN_LEVEL_MAX: u32 = 10;
pub const DEFAULT_RECALC_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 10_000;
pub const NEARBY_RADIUS: f64 = 40.0;
pub const NEARBY_FALLBACK_LEVEL: u32 = 5;
pub const UNMAPPED_REGION_LEVEL: u32 = 1;
pub const MISSING_REGION_LEVEL: u32 = 0;
pub const MISSING_BIOME_LEVEL: u32 = 6;
pub const DEFAULT_MOB_HEALTH_MULTIPLIER: f32 = 0.1;

// File names
pub const CONFIG_FILE: &str = "leveling.toml";
pub const SNAPSHOT_FILE: &str = "mob-levels.json";
pub const PLAYERS_DIR: &str = "players";
pub const FORMULA_STAMP_FILE: &str = "formula.json";
