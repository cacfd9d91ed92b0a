use serde::{Deserialize, Serialize};

/// In-memory level state of one non-player actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicLevel {
    pub level: u32,
    /// Simulation time of the last recomputation; `None` until the first one
    pub last_recalc_ms: Option<u64>,
    /// Locked actors keep their level and are never recomputed
    pub locked: bool,
    /// Level the stat scaling was last applied for
    pub last_applied_level: Option<u32>,
}

impl DynamicLevel {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            last_recalc_ms: None,
            locked: false,
            last_applied_level: None,
        }
    }

    pub fn restored(persisted: &PersistedLevel) -> Self {
        Self {
            locked: persisted.locked,
            ..Self::new(persisted.spawn_level)
        }
    }

    /// Whether at least `interval_ms` passed since the last recomputation.
    pub fn is_due(&self, now_ms: u64, interval_ms: u64) -> bool {
        match self.last_recalc_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        }
    }
}

/// Snapshot entry: `{ "spawnLevel": n, "locked": b }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLevel {
    pub spawn_level: u32,
    #[serde(default)]
    pub locked: bool,
}
