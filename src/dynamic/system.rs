//! Periodic level recomputation for non-player actors.

use super::compute::{compute_level, ComputeInput, LevelLookup, Position, WorldView};
use super::mode::LevelMode;
use super::record::{DynamicLevel, PersistedLevel};
use super::registry::{spawn_level_for, DynamicLevelRegistry};
use super::snapshot::SnapshotStore;
use crate::core::config::MobConfig;
use crate::tables::LookupTables;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Host hook that applies level-dependent stat modifiers to an actor.
pub trait StatScaler {
    fn apply_scaling(&self, actor_id: Uuid, level: u32, health_multiplier: f32);
}

/// Result of one [`DynamicLevelSystem::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Locked { level: u32 },
    /// Recomputed too recently; level unchanged
    Throttled { level: u32 },
    /// `scaled` is true when the stat scaler was invoked for the new level
    Computed { level: u32, scaled: bool },
}

impl TickOutcome {
    pub fn level(&self) -> u32 {
        match *self {
            TickOutcome::Locked { level }
            | TickOutcome::Throttled { level }
            | TickOutcome::Computed { level, .. } => level,
        }
    }
}

enum Gate {
    Locked(u32),
    Throttled(u32),
    Due(u32),
}

pub struct DynamicLevelSystem {
    registry: DynamicLevelRegistry,
    snapshot: Arc<SnapshotStore>,
    tables: Arc<LookupTables>,
    mode: LevelMode,
    config: MobConfig,
    max_level: u32,
    last_flush_ms: AtomicU64,
}

impl DynamicLevelSystem {
    pub fn new(
        snapshot: Arc<SnapshotStore>,
        tables: Arc<LookupTables>,
        config: &MobConfig,
        max_level: u32,
    ) -> Self {
        let mode = LevelMode::from_config(&config.level_mode);
        debug!("Dynamic levels use {} (max level {})", mode.name(), max_level);
        Self {
            registry: DynamicLevelRegistry::new(),
            snapshot,
            tables,
            mode,
            config: config.clone(),
            max_level: max_level.max(1),
            last_flush_ms: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> LevelMode {
        self.mode
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn registry(&self) -> &DynamicLevelRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> &Arc<SnapshotStore> {
        &self.snapshot
    }

    /// Current level, registering the actor first if needed.
    pub fn level_of(&self, actor_id: Uuid) -> u32 {
        self.get_or_create(actor_id).level
    }

    /// Max-health multiplier for `level`: `1 + (level - 1) * health_multiplier`.
    pub fn health_multiplier(&self, level: u32) -> f32 {
        1.0 + level.saturating_sub(1) as f32 * self.config.health_multiplier
    }

    /// Recompute the actor's level if it is unlocked and due.
    ///
    /// The throttle slot is claimed under the registry lock, so two ticks on
    /// the same actor never both recompute. The strategy and the scaler run
    /// outside the lock.
    pub fn tick(
        &self,
        actor_id: Uuid,
        position: Position,
        now_ms: u64,
        world: &dyn WorldView,
        levels: &dyn LevelLookup,
        scaler: &dyn StatScaler,
    ) -> TickOutcome {
        let interval = self.config.recalc_interval_ms;
        let gate = loop {
            let gate = self.registry.with(actor_id, |record| {
                if record.locked {
                    Gate::Locked(record.level)
                } else if !record.is_due(now_ms, interval) {
                    Gate::Throttled(record.level)
                } else {
                    record.last_recalc_ms = Some(now_ms);
                    Gate::Due(record.level)
                }
            });
            match gate {
                Some(gate) => break gate,
                // Removed between calls; register and try again.
                None => {
                    self.get_or_create(actor_id);
                }
            }
        };

        let current_level = match gate {
            Gate::Locked(level) => return TickOutcome::Locked { level },
            Gate::Throttled(level) => return TickOutcome::Throttled { level },
            Gate::Due(level) => level,
        };

        let input = ComputeInput {
            current_level,
            position,
            radius: self.config.nearby_radius,
            world,
            levels,
            tables: &self.tables,
        };
        let level = compute_level(self.mode, &input).clamp(1, self.max_level);

        let needs_scaling = self
            .registry
            .with(actor_id, |record| {
                if record.level != level {
                    debug!("Actor {} level {} -> {}", actor_id, record.level, level);
                    record.level = level;
                }
                if record.last_applied_level == Some(level) {
                    false
                } else {
                    record.last_applied_level = Some(level);
                    true
                }
            })
            .unwrap_or(false);

        if needs_scaling {
            scaler.apply_scaling(actor_id, level, self.health_multiplier(level));
        }
        TickOutcome::Computed {
            level,
            scaled: needs_scaling,
        }
    }

    /// Lock or unlock the actor, mirroring the flag into the snapshot.
    pub fn set_locked(&self, actor_id: Uuid, locked: bool) {
        let record = self.get_or_create(actor_id);
        self.registry.with(actor_id, |r| r.locked = locked);
        let spawn_level = self
            .snapshot
            .get(actor_id)
            .map_or(record.level, |entry| entry.spawn_level);
        self.snapshot.put(
            actor_id,
            PersistedLevel {
                spawn_level,
                locked,
            },
        );
    }

    /// Pin the actor to `level` and lock it.
    pub fn set_level(&self, actor_id: Uuid, level: u32) -> u32 {
        let level = level.clamp(1, self.max_level);
        self.get_or_create(actor_id);
        self.registry.with(actor_id, |r| {
            r.level = level;
            r.locked = true;
        });
        self.snapshot.put(
            actor_id,
            PersistedLevel {
                spawn_level: level,
                locked: true,
            },
        );
        level
    }

    /// The actor left the simulation. Its snapshot entry is kept so it comes
    /// back with the same spawn level.
    pub fn remove(&self, actor_id: Uuid) -> Option<DynamicLevel> {
        self.registry.remove(actor_id)
    }

    /// Drop the actor from both the registry and the snapshot.
    pub fn forget(&self, actor_id: Uuid) {
        self.registry.remove(actor_id);
        self.snapshot.remove(actor_id);
    }

    /// Save the snapshot if `flush_interval_ms` passed since the last flush.
    /// Returns whether a flush was attempted.
    pub fn maybe_flush(&self, now_ms: u64) -> bool {
        let last = self.last_flush_ms.load(Ordering::SeqCst);
        if now_ms.saturating_sub(last) < self.config.flush_interval_ms {
            return false;
        }
        if self
            .last_flush_ms
            .compare_exchange(last, now_ms, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.snapshot.save();
        true
    }

    pub fn flush(&self) -> bool {
        self.snapshot.save()
    }

    fn get_or_create(&self, actor_id: Uuid) -> DynamicLevel {
        self.registry
            .get_or_create(actor_id, &self.snapshot, || spawn_level_for(actor_id))
    }
}
