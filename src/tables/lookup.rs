use super::defaults::*;
use super::loader::{parse_by_level, parse_delimited, parse_named, read_or_create};
use crate::core::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReward {
    pub item_id: String,
    pub quantity: u32,
}

/// Read-only tables loaded once at startup and shared afterwards.
///
/// Region tables (instance, zone, biome) are keyed in lower case; the other
/// tables keep the ids exactly as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTables {
    pub xp_mapping: HashMap<String, u64>,
    pub item_levels: HashMap<String, u32>,
    pub level_rewards: BTreeMap<u32, Vec<LevelReward>>,
    pub stats_per_level: BTreeMap<u32, u32>,
    pub instance_levels: HashMap<String, u32>,
    pub zone_levels: HashMap<String, u32>,
    pub biome_levels: HashMap<String, u32>,
}

impl LookupTables {
    /// Load every table from `data_dir`, writing the bundled defaults for any
    /// file that does not exist yet.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let read = |file: &str, default: &str| read_or_create(&data_dir.join(file), default);

        let tables = Self {
            xp_mapping: parse_named(&read(XP_MAPPING_FILE, DEFAULT_XP_MAPPING)?, XP_MAPPING_HEADER, false),
            item_levels: parse_named(
                &read(ITEM_LEVELS_FILE, DEFAULT_ITEM_LEVELS)?,
                ITEM_LEVELS_HEADER,
                false,
            ),
            level_rewards: parse_rewards(&read(LEVEL_REWARDS_FILE, DEFAULT_LEVEL_REWARDS)?),
            stats_per_level: parse_by_level(
                &read(STATS_PER_LEVEL_FILE, DEFAULT_STATS_PER_LEVEL)?,
                STATS_PER_LEVEL_HEADER,
            ),
            instance_levels: parse_named(
                &read(INSTANCE_LEVELS_FILE, DEFAULT_INSTANCE_LEVELS)?,
                INSTANCE_LEVELS_HEADER,
                true,
            ),
            zone_levels: parse_named(&read(ZONE_LEVELS_FILE, DEFAULT_ZONE_LEVELS)?, ZONE_LEVELS_HEADER, true),
            biome_levels: parse_named(
                &read(BIOME_LEVELS_FILE, DEFAULT_BIOME_LEVELS)?,
                BIOME_LEVELS_HEADER,
                true,
            ),
        };

        info!(
            "Loaded lookup tables: {} xp mappings, {} item levels, {} reward levels, {} zones, {} biomes, {} instances",
            tables.xp_mapping.len(),
            tables.item_levels.len(),
            tables.level_rewards.len(),
            tables.zone_levels.len(),
            tables.biome_levels.len(),
            tables.instance_levels.len()
        );
        Ok(tables)
    }

    pub fn xp_for_npc(&self, npc_type: &str) -> Option<u64> {
        self.xp_mapping.get(npc_type).copied()
    }

    pub fn item_level(&self, item_id: &str) -> Option<u32> {
        self.item_levels.get(item_id).copied()
    }

    pub fn instance_level(&self, instance: &str) -> Option<u32> {
        self.instance_levels.get(&instance.to_lowercase()).copied()
    }

    pub fn zone_level(&self, zone: &str) -> Option<u32> {
        self.zone_levels.get(&zone.to_lowercase()).copied()
    }

    pub fn biome_level(&self, biome: &str) -> Option<u32> {
        self.biome_levels.get(&biome.to_lowercase()).copied()
    }
}

/// `level,item,quantity` rows grouped by level, in file order.
fn parse_rewards(text: &str) -> BTreeMap<u32, Vec<LevelReward>> {
    let mut rewards: BTreeMap<u32, Vec<LevelReward>> = BTreeMap::new();

    for row in parse_delimited(text, LEVEL_REWARDS_HEADER) {
        let Ok(level) = row.key.parse::<u32>() else {
            warn!("Invalid reward level on line {}: {}", row.line, row.key);
            continue;
        };
        let Some((item, quantity)) = row.value.split_once(',') else {
            warn!("Reward on line {} needs item and quantity: {}", row.line, row.value);
            continue;
        };
        let item = item.trim();
        let Ok(quantity) = quantity.trim().parse::<u32>() else {
            warn!("Invalid reward quantity on line {}: {}", row.line, quantity);
            continue;
        };
        if item.is_empty() || quantity == 0 {
            warn!("Skipping empty reward on line {}", row.line);
            continue;
        }

        rewards.entry(level).or_default().push(LevelReward {
            item_id: item.to_string(),
            quantity,
        });
    }

    rewards
}
