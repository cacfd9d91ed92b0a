//! Level strategies for non-player actors.
//!
//! The host world is read through [`WorldView`] and player levels through
//! [`LevelLookup`], so computation never touches host storage directly.

use super::mode::LevelMode;
use crate::core::constants::{
    MISSING_BIOME_LEVEL, MISSING_REGION_LEVEL, NEARBY_FALLBACK_LEVEL, UNMAPPED_REGION_LEVEL,
};
use crate::progression::ProgressionService;
use crate::tables::LookupTables;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// What the host world exposes to the level strategies.
pub trait WorldView {
    /// Player actors and their current positions.
    fn players(&self) -> Vec<(Uuid, Position)>;
    fn instance_name(&self) -> Option<&str>;
    fn current_zone(&self) -> Option<&str>;
    fn current_biome(&self) -> Option<&str>;
}

/// Source of player levels.
pub trait LevelLookup {
    fn player_level(&self, actor_id: Uuid) -> Option<u32>;
}

impl LevelLookup for ProgressionService {
    fn player_level(&self, actor_id: Uuid) -> Option<u32> {
        self.get_level(actor_id).ok()
    }
}

/// Inputs shared by every strategy for one recomputation.
pub struct ComputeInput<'a> {
    pub current_level: u32,
    pub position: Position,
    pub radius: f64,
    pub world: &'a dyn WorldView,
    pub levels: &'a dyn LevelLookup,
    pub tables: &'a LookupTables,
}

/// Raw (unclamped) level for `mode`.
pub fn compute_level(mode: LevelMode, input: &ComputeInput<'_>) -> u32 {
    match mode {
        LevelMode::SpawnOnly => input.current_level,
        LevelMode::NearbyPlayersMean => {
            nearby_players_mean(input.position, input.radius, input.world, input.levels)
        }
        LevelMode::Zone => zone_level(input.world, input.tables),
        LevelMode::Biome => biome_level(input.world, input.tables),
        LevelMode::Instance => instance_level(input.world, input.tables),
    }
}

/// Rounded mean level of players within `radius`; the fallback level when none
/// are in range. Players without a known level are ignored.
pub fn nearby_players_mean(
    position: Position,
    radius: f64,
    world: &dyn WorldView,
    levels: &dyn LevelLookup,
) -> u32 {
    let radius_sq = radius * radius;
    let (sum, count) = world
        .players()
        .into_iter()
        .filter(|(_, pos)| pos.distance_squared(&position) <= radius_sq)
        .filter_map(|(id, _)| levels.player_level(id))
        .fold((0u64, 0u64), |(sum, count), level| (sum + level as u64, count + 1));

    if count == 0 {
        return NEARBY_FALLBACK_LEVEL;
    }
    (sum as f64 / count as f64).round() as u32
}

pub fn zone_level(world: &dyn WorldView, tables: &LookupTables) -> u32 {
    match world.current_zone() {
        Some(zone) => tables.zone_level(zone).unwrap_or(UNMAPPED_REGION_LEVEL),
        None => MISSING_REGION_LEVEL,
    }
}

pub fn biome_level(world: &dyn WorldView, tables: &LookupTables) -> u32 {
    match world.current_biome() {
        Some(biome) => tables.biome_level(biome).unwrap_or(UNMAPPED_REGION_LEVEL),
        None => MISSING_BIOME_LEVEL,
    }
}

/// A blank instance name counts as no instance.
pub fn instance_level(world: &dyn WorldView, tables: &LookupTables) -> u32 {
    match world.instance_name().map(str::trim) {
        Some(name) if !name.is_empty() => {
            tables.instance_level(name).unwrap_or(UNMAPPED_REGION_LEVEL)
        }
        _ => MISSING_REGION_LEVEL,
    }
}
