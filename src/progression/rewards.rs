//! Level-change side effects: ability point totals and per-level rewards.

use super::service::ProgressionService;
use crate::core::config::ProgressionConfig;
use crate::core::constants::{DEFAULT_STATS_PER_LEVEL, MIN_ABILITY_POINT_TOTAL};
use crate::tables::{LevelReward, LookupTables};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};
use tracing::warn;
use uuid::Uuid;

/// How many ability points a level is worth.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityPointPolicy {
    per_level: u32,
    /// Per-level overrides; levels missing from the table use the default of 5
    table: Option<BTreeMap<u32, u32>>,
}

impl AbilityPointPolicy {
    pub fn flat(per_level: u32) -> Self {
        Self {
            per_level,
            table: None,
        }
    }

    pub fn from_table(table: BTreeMap<u32, u32>) -> Self {
        Self {
            per_level: DEFAULT_STATS_PER_LEVEL,
            table: Some(table),
        }
    }

    /// `None` when ability point gain is disabled.
    pub fn from_config(config: &ProgressionConfig, tables: &LookupTables) -> Option<Self> {
        if config.disable_stat_point_gain_on_level_up {
            return None;
        }
        if config.use_stats_per_level_mapping {
            Some(Self::from_table(tables.stats_per_level.clone()))
        } else {
            Some(Self::flat(config.stats_per_level))
        }
    }

    pub fn points_per_level(&self, level: u32) -> u32 {
        match &self.table {
            Some(table) => table.get(&level).copied().unwrap_or(DEFAULT_STATS_PER_LEVEL),
            None => self.per_level,
        }
    }

    /// Total points an actor at `level` should own after levelling up.
    pub fn total_for_level(&self, level: u32) -> u32 {
        level
            .saturating_mul(self.points_per_level(level))
            .max(MIN_ABILITY_POINT_TOTAL)
    }

    /// Total handed back after a level-down respec. Level 1 gets a single
    /// level's worth.
    pub fn total_after_level_down(&self, level: u32) -> u32 {
        let per_level = self.points_per_level(level);
        if level <= 1 {
            per_level
        } else {
            level.saturating_mul(per_level)
        }
    }
}

/// Remembers the highest level each actor was rewarded for, so every reward
/// level is handed out at most once.
#[derive(Debug, Default)]
pub struct LevelRewardTracker {
    rewards: BTreeMap<u32, Vec<LevelReward>>,
    last_rewarded: Mutex<HashMap<Uuid, u32>>,
}

impl LevelRewardTracker {
    pub fn new(rewards: BTreeMap<u32, Vec<LevelReward>>) -> Self {
        Self {
            rewards,
            last_rewarded: Mutex::new(HashMap::new()),
        }
    }

    /// Rewards for levels in `(last_rewarded, new_level]`, by level. Empty if
    /// the actor was already rewarded up to `new_level`.
    pub fn claim(&self, actor_id: Uuid, new_level: u32) -> Vec<(u32, Vec<LevelReward>)> {
        let mut last_rewarded = self.last_rewarded.lock().unwrap_or_else(|e| e.into_inner());
        let last = last_rewarded.get(&actor_id).copied().unwrap_or(0);
        if new_level <= last {
            return Vec::new();
        }
        last_rewarded.insert(actor_id, new_level);

        self.rewards
            .range(last + 1..=new_level)
            .filter(|(_, rewards)| !rewards.is_empty())
            .map(|(&level, rewards)| (level, rewards.clone()))
            .collect()
    }

    /// Forget the actor, so later level-ups pay out again.
    pub fn clear(&self, actor_id: Uuid) {
        self.last_rewarded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&actor_id);
    }
}

/// Receives `(actor, level, rewards)` for each rewarded level. Granting the
/// items is up to the host.
pub type RewardSink = Arc<dyn Fn(Uuid, u32, &[LevelReward]) + Send + Sync>;

pub struct RewardHook {
    pub tracker: Arc<LevelRewardTracker>,
    pub sink: RewardSink,
}

/// Wire ability point recalculation and level rewards to the service's level
/// listeners. The listeners hold a weak handle, so they do not keep the
/// service alive.
///
/// On level-up the total becomes [`AbilityPointPolicy::total_for_level`]. On
/// level-down the actor is respecced with
/// [`AbilityPointPolicy::total_after_level_down`] and their reward history is
/// cleared.
pub fn install_level_hooks(
    service: &Arc<ProgressionService>,
    policy: Option<AbilityPointPolicy>,
    rewards: Option<RewardHook>,
) {
    let rewards = rewards.map(Arc::new);

    {
        let weak: Weak<ProgressionService> = Arc::downgrade(service);
        let policy = policy.clone();
        let rewards = rewards.clone();
        service.register_level_up_listener(move |actor_id, _old_level, new_level| {
            if let Some(hook) = &rewards {
                for (level, items) in hook.tracker.claim(actor_id, new_level) {
                    (hook.sink)(actor_id, level, items.as_slice());
                }
            }
            let (Some(policy), Some(service)) = (&policy, weak.upgrade()) else {
                return;
            };
            let total = policy.total_for_level(new_level);
            if let Err(e) = service.set_ability_points(actor_id, total) {
                warn!("Failed to grant ability points to {}: {}", actor_id, e);
            }
        });
    }

    let weak: Weak<ProgressionService> = Arc::downgrade(service);
    service.register_level_down_listener(move |actor_id, _old_level, new_level| {
        if let Some(hook) = &rewards {
            hook.tracker.clear(actor_id);
        }
        let (Some(policy), Some(service)) = (&policy, weak.upgrade()) else {
            return;
        };
        let total = policy.total_after_level_down(new_level);
        if let Err(e) = service.respec(actor_id, total) {
            warn!("Failed to respec {} after level down: {}", actor_id, e);
        }
    });
}
