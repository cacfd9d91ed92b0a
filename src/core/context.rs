//! Process-wide context: everything the engine needs, built once at startup
//! and handed to the host explicitly.

use super::config::LevelingConfig;
use super::error::Result;
use crate::dynamic::{DynamicLevelSystem, SnapshotStore};
use crate::formula::{migrate_if_needed, FormulaDescriptor, LevelFormula, MigrationOutcome};
use crate::progression::{
    install_level_hooks, AbilityPointPolicy, JsonFileStore, LevelRewardTracker, ProgressionService,
    ProgressionStore, RewardHook, RewardSink,
};
use crate::tables::LookupTables;
use crate::utils::persistence::data_dir;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct LevelingContext {
    pub data_dir: PathBuf,
    pub config: LevelingConfig,
    pub tables: Arc<LookupTables>,
    pub descriptor: FormulaDescriptor,
    pub formula: Arc<LevelFormula>,
    pub service: Arc<ProgressionService>,
    pub dynamic: DynamicLevelSystem,
    pub migration: Option<MigrationOutcome>,
}

impl LevelingContext {
    /// Bootstrap from `data_dir` with players stored as JSON files.
    ///
    /// `reward_sink` receives level-up rewards when rewards are enabled in the
    /// config; without a sink rewards are not tracked.
    pub fn open(data_dir: &Path, reward_sink: Option<RewardSink>) -> Result<Self> {
        let config = LevelingConfig::load_or_create(data_dir)?;
        let store = JsonFileStore::open(data_dir.join(&config.storage.players_dir))?;
        Self::with_store(data_dir, config, Arc::new(store), reward_sink)
    }

    /// Bootstrap from `~/.leveling`.
    pub fn open_default(reward_sink: Option<RewardSink>) -> Result<Self> {
        Self::open(&data_dir()?, reward_sink)
    }

    /// Bootstrap with an explicit config and persistence backend.
    pub fn with_store(
        data_dir: &Path,
        config: LevelingConfig,
        store: Arc<dyn ProgressionStore>,
        reward_sink: Option<RewardSink>,
    ) -> Result<Self> {
        let tables = Arc::new(LookupTables::load_or_create(data_dir)?);

        let descriptor = FormulaDescriptor::from_config(&config.formula, data_dir)?;
        let formula = Arc::new(descriptor.build()?);
        info!(
            "Using {} formula (max level {})",
            formula.name(),
            formula.max_level()
        );

        let migration = if config.formula.migrate_xp {
            Some(migrate_if_needed(store.as_ref(), &descriptor)?)
        } else {
            None
        };

        let service = Arc::new(ProgressionService::new(
            Arc::clone(&formula),
            store,
            config.progression.cache_capacity,
        ));

        let policy = AbilityPointPolicy::from_config(&config.progression, &tables);
        let rewards = match reward_sink {
            Some(sink) if config.progression.enable_level_up_rewards => Some(RewardHook {
                tracker: Arc::new(LevelRewardTracker::new(tables.level_rewards.clone())),
                sink,
            }),
            _ => None,
        };
        install_level_hooks(&service, policy, rewards);

        let snapshot = Arc::new(SnapshotStore::new(
            data_dir.join(&config.storage.snapshot_file),
        ));
        snapshot.load();
        let dynamic = DynamicLevelSystem::new(
            snapshot,
            Arc::clone(&tables),
            &config.mobs,
            formula.max_level(),
        );

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config,
            tables,
            descriptor,
            formula,
            service,
            dynamic,
            migration,
        })
    }

    /// Flush the dynamic level snapshot and close the progression store.
    pub fn shutdown(&self) -> Result<()> {
        self.dynamic.flush();
        self.service.close()?;
        info!("Leveling engine shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::MemoryStore;

    #[test]
    fn test_open_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LevelingContext::open(dir.path(), None).unwrap();

        assert!(dir.path().join("leveling.toml").exists());
        assert!(dir.path().join("mobzonemapping.csv").exists());
        assert_eq!(ctx.tables.zone_level("zone2"), Some(20));
        assert!(dir.path().join("players").is_dir());
        assert_eq!(ctx.formula.name(), "exponential");
        assert_eq!(ctx.migration, Some(MigrationOutcome::FirstRun));
        ctx.shutdown().unwrap();
    }

    #[test]
    fn test_migration_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LevelingConfig::default();
        config.formula.migrate_xp = false;
        let ctx =
            LevelingContext::with_store(dir.path(), config, Arc::new(MemoryStore::new()), None)
                .unwrap();
        assert_eq!(ctx.migration, None);
    }
}
