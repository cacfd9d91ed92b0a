//! Dynamic level integration tests
//!
//! Runs non-player actors through the full tick path with real player levels
//! from the progression service and a snapshot on disk.

use leveling::core::config::MobConfig;
use leveling::dynamic::{
    spawn_level_for, DynamicLevelSystem, LevelLookup, PersistedLevel, Position, SnapshotStore,
    StatScaler, TickOutcome, WorldView,
};
use leveling::formula::LevelFormula;
use leveling::progression::{MemoryStore, ProgressionService};
use leveling::tables::LookupTables;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct World {
    players: Vec<(Uuid, Position)>,
    zone: Option<String>,
    biome: Option<String>,
    instance: Option<String>,
}

impl WorldView for World {
    fn players(&self) -> Vec<(Uuid, Position)> {
        self.players.clone()
    }
    fn instance_name(&self) -> Option<&str> {
        self.instance.as_deref()
    }
    fn current_zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }
    fn current_biome(&self) -> Option<&str> {
        self.biome.as_deref()
    }
}

#[derive(Default)]
struct Scaler {
    calls: Mutex<Vec<(Uuid, u32, f32)>>,
}

impl StatScaler for Scaler {
    fn apply_scaling(&self, actor_id: Uuid, level: u32, health_multiplier: f32) {
        self.calls
            .lock()
            .unwrap()
            .push((actor_id, level, health_multiplier));
    }
}

fn system(dir: &Path, mode: &str, max_level: u32) -> DynamicLevelSystem {
    let snapshot = Arc::new(SnapshotStore::new(dir.join("mob-levels.json")));
    snapshot.load();
    let tables = LookupTables::load_or_create(dir).unwrap();
    let config = MobConfig {
        level_mode: mode.to_string(),
        ..MobConfig::default()
    };
    DynamicLevelSystem::new(snapshot, Arc::new(tables), &config, max_level)
}

fn players_service() -> ProgressionService {
    ProgressionService::new(
        Arc::new(LevelFormula::linear(100, 60).unwrap()),
        Arc::new(MemoryStore::new()),
        100,
    )
}

#[test]
fn test_level_within_bounds_for_every_mode() {
    let dir = tempfile::tempdir().unwrap();
    let service = players_service();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let mut players = Vec::new();
    for _ in 0..8 {
        let id = Uuid::new_v4();
        service.set_level(id, rng.gen_range(1..=60)).unwrap();
        let pos = Position::new(rng.gen_range(-60.0..60.0), 0.0, rng.gen_range(-60.0..60.0));
        players.push((id, pos));
    }

    let worlds = [
        World {
            players: players.clone(),
            zone: Some("Zone3".to_string()),
            biome: Some("jungle".to_string()),
            instance: Some("Dungeon_Crypt".to_string()),
        },
        World {
            players: Vec::new(),
            zone: None,
            biome: None,
            instance: None,
        },
    ];

    for mode in ["SPAWN_ONLY", "NEARBY_PLAYERS_MEAN", "ZONE", "BIOME", "INSTANCE"] {
        for max_level in [1, 7, 25, 100] {
            let system = system(dir.path(), mode, max_level);
            let scaler = Scaler::default();
            for world in &worlds {
                let mob = Uuid::new_v4();
                let outcome = system.tick(
                    mob,
                    Position::default(),
                    0,
                    world,
                    &service as &dyn LevelLookup,
                    &scaler,
                );
                let level = outcome.level();
                assert!(
                    level >= 1 && level <= max_level,
                    "{} gave {} (max {})",
                    mode,
                    level,
                    max_level
                );
            }
        }
    }
}

#[test]
fn test_nearby_mean_uses_player_levels() {
    let dir = tempfile::tempdir().unwrap();
    let service = players_service();
    let near_a = Uuid::new_v4();
    let near_b = Uuid::new_v4();
    let far = Uuid::new_v4();
    service.set_level(near_a, 10).unwrap();
    service.set_level(near_b, 21).unwrap();
    service.set_level(far, 60).unwrap();

    let world = World {
        players: vec![
            (near_a, Position::new(5.0, 0.0, 5.0)),
            (near_b, Position::new(-20.0, 3.0, 0.0)),
            (far, Position::new(300.0, 0.0, 0.0)),
        ],
        zone: None,
        biome: None,
        instance: None,
    };
    let system = system(dir.path(), "NEARBY_PLAYERS_MEAN", 100);
    let scaler = Scaler::default();
    let mob = Uuid::new_v4();

    let outcome = system.tick(mob, Position::default(), 0, &world, &service, &scaler);
    // (10 + 21) / 2 = 15.5 rounds to 16
    assert_eq!(outcome, TickOutcome::Computed { level: 16, scaled: true });
    let calls = scaler.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!((calls[0].2 - 2.5).abs() < 1e-5);
}

#[test]
fn test_scaling_applied_once_per_change() {
    let dir = tempfile::tempdir().unwrap();
    let service = players_service();
    let player = Uuid::new_v4();
    service.set_level(player, 10).unwrap();
    let world = World {
        players: vec![(player, Position::default())],
        zone: None,
        biome: None,
        instance: None,
    };
    let system = system(dir.path(), "NEARBY_PLAYERS_MEAN", 100);
    let scaler = Scaler::default();
    let mob = Uuid::new_v4();

    for tick in 0..5u64 {
        system.tick(mob, Position::default(), tick * 2_000, &world, &service, &scaler);
    }
    service.set_level(player, 30).unwrap();
    for tick in 5..8u64 {
        system.tick(mob, Position::default(), tick * 2_000, &world, &service, &scaler);
    }

    let levels: Vec<u32> = scaler.calls.lock().unwrap().iter().map(|c| c.1).collect();
    assert_eq!(levels, vec![10, 30]);
}

#[test]
fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let service = players_service();
    let world = World {
        players: Vec::new(),
        zone: None,
        biome: None,
        instance: None,
    };
    let mob = Uuid::new_v4();
    let locked_mob = Uuid::new_v4();
    {
        let system = system(dir.path(), "SPAWN_ONLY", 100);
        let scaler = Scaler::default();
        system.tick(mob, Position::default(), 0, &world, &service, &scaler);
        system.set_level(locked_mob, 42);
        assert!(system.flush());
    }

    let system = system(dir.path(), "NEARBY_PLAYERS_MEAN", 100);
    assert_eq!(
        system.snapshot().get(mob),
        Some(PersistedLevel {
            spawn_level: spawn_level_for(mob),
            locked: false
        })
    );
    let scaler = Scaler::default();
    assert_eq!(
        system.tick(locked_mob, Position::default(), 0, &world, &service, &scaler),
        TickOutcome::Locked { level: 42 }
    );
    // Unlocked actors resume recomputation; nobody nearby gives the fallback.
    assert_eq!(
        system.tick(mob, Position::default(), 0, &world, &service, &scaler),
        TickOutcome::Computed { level: 5, scaled: true }
    );
}

#[test]
fn test_region_tables_from_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let service = players_service();
    let scaler = Scaler::default();
    let world = World {
        players: Vec::new(),
        zone: Some("ZONE2".to_string()),
        biome: Some("Forest".to_string()),
        instance: Some("dungeon_crypt".to_string()),
    };

    let expected = [("ZONE", 20), ("BIOME", 4), ("INSTANCE", 30)];
    for (mode, level) in expected {
        let system = system(dir.path(), mode, 100);
        let outcome = system.tick(Uuid::new_v4(), Position::default(), 0, &world, &service, &scaler);
        assert_eq!(outcome.level(), level, "{}", mode);
    }
}
