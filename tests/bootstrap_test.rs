//! Startup integration tests
//!
//! Boots the engine from a data directory the way a host does and exercises
//! the gameplay rules on top of the wired-up context.

use leveling::core::config::LevelingConfig;
use leveling::progression::{
    apply_death_penalty, check_item_requirement, kill_xp, DeathPenalty, ItemGate, RewardSink,
};
use leveling::tables::LevelReward;
use leveling::LevelingContext;
use std::fs;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Granted = Arc<Mutex<Vec<(u32, Vec<LevelReward>)>>>;

fn sink() -> (Granted, RewardSink) {
    let granted: Granted = Arc::new(Mutex::new(Vec::new()));
    let target = Arc::clone(&granted);
    let sink: RewardSink = Arc::new(move |_: Uuid, level: u32, items: &[LevelReward]| {
        target.lock().unwrap().push((level, items.to_vec()));
    });
    (granted, sink)
}

#[test]
fn test_first_start_writes_every_default_file() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LevelingContext::open(dir.path(), None).unwrap();

    for file in [
        "leveling.toml",
        "xpmapping.csv",
        "itemlevels.csv",
        "levelrewards.csv",
        "statsperlevel.csv",
        "mobinstancemapping.csv",
        "mobzonemapping.csv",
        "mobbiomemapping.csv",
    ] {
        assert!(dir.path().join(file).exists(), "{} missing", file);
    }
    assert_eq!(ctx.formula.max_level(), 100_000);
    ctx.shutdown().unwrap();

    let config = LevelingConfig::from_toml_str(
        &fs::read_to_string(dir.path().join("leveling.toml")).unwrap(),
    )
    .unwrap();
    assert_eq!(config, LevelingConfig::default());
}

#[test]
fn test_partial_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("leveling.toml"),
        "[formula]\ntype = \"Linear\"\n\n[formula.linear]\nxp_per_level = 250\nmax_level = 40\n",
    )
    .unwrap();

    let ctx = LevelingContext::open(dir.path(), None).unwrap();
    assert_eq!(ctx.formula.name(), "linear");
    assert_eq!(ctx.formula.max_level(), 40);
    assert_eq!(ctx.dynamic.max_level(), 40);
    assert_eq!(ctx.config.progression.stats_per_level, 5);
}

#[test]
fn test_invalid_formula_type_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("leveling.toml"), "[formula]\ntype = \"cubic\"\n").unwrap();
    assert!(LevelingContext::open(dir.path(), None).is_err());
}

#[test]
fn test_table_formula_from_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("leveling.toml"),
        "[formula]\ntype = \"table\"\n",
    )
    .unwrap();

    let ctx = LevelingContext::open(dir.path(), None).unwrap();
    assert!(dir.path().join("levels.csv").exists());
    assert_eq!(ctx.formula.max_level(), 20);
    assert_eq!(ctx.formula.level_for_xp(400).unwrap(), 3);
}

#[test]
fn test_level_up_rewards_paid_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LevelingConfig::default();
    config.formula.kind = "linear".to_string();
    config.progression.enable_level_up_rewards = true;
    fs::write(
        dir.path().join("leveling.toml"),
        config.to_toml_string().unwrap(),
    )
    .unwrap();

    let (granted, sink) = sink();
    let ctx = LevelingContext::open(dir.path(), Some(sink)).unwrap();
    let actor = Uuid::new_v4();

    ctx.service.set_level(actor, 12).unwrap();
    ctx.service.set_level(actor, 12).unwrap();
    let levels: Vec<u32> = granted.lock().unwrap().iter().map(|g| g.0).collect();
    assert_eq!(levels, vec![5, 10]);
    assert_eq!(ctx.service.get_ability_points(actor).unwrap(), 60);

    // A level-down forgets the history, so the next climb pays again.
    ctx.service.remove_level(actor, 8).unwrap();
    ctx.service.set_level(actor, 6).unwrap();
    let levels: Vec<u32> = granted.lock().unwrap().iter().map(|g| g.0).collect();
    assert_eq!(levels, vec![5, 10, 5]);
}

#[test]
fn test_kill_and_death_rules() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = LevelingConfig::default();
    config.formula.kind = "linear".to_string();
    config.death.enable_xp_loss_on_death = true;
    config.death.min_level_for_level_down = 2;
    fs::write(
        dir.path().join("leveling.toml"),
        config.to_toml_string().unwrap(),
    )
    .unwrap();

    let ctx = LevelingContext::open(dir.path(), None).unwrap();
    let actor = Uuid::new_v4();

    let skeleton = kill_xp(&ctx.config.kill_xp, &ctx.tables, "Skeleton", 500.0).unwrap();
    assert_eq!(skeleton, 25);
    let wolf = kill_xp(&ctx.config.kill_xp, &ctx.tables, "Wolf", 300.0).unwrap();
    assert_eq!(wolf, 150);

    ctx.service.add_xp(actor, 550).unwrap(); // level 6
    let penalty = apply_death_penalty(&ctx.service, &ctx.config.death, actor).unwrap();
    // 10% of 550 is 55, but the level floor of 500 caps the loss at 50.
    assert_eq!(
        penalty,
        DeathPenalty::XpLost {
            amount: 50,
            old_level: 6,
            new_level: 6
        }
    );
    assert_eq!(ctx.service.get_xp(actor).unwrap(), 500);

    let level = ctx.service.get_level(actor).unwrap();
    assert_eq!(
        check_item_requirement(&ctx.tables, "Weapon_Sword_Iron", level),
        ItemGate::Denied { required: 10 }
    );
    assert_eq!(
        check_item_requirement(&ctx.tables, "Stick", level),
        ItemGate::Unrestricted
    );
}

#[test]
fn test_shutdown_flushes_dynamic_levels() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = LevelingContext::open(dir.path(), None).unwrap();
    let mob = Uuid::new_v4();
    let level = ctx.dynamic.level_of(mob);
    ctx.shutdown().unwrap();

    let ctx = LevelingContext::open(dir.path(), None).unwrap();
    assert_eq!(ctx.dynamic.snapshot().get(mob).map(|e| e.spawn_level), Some(level));
}
