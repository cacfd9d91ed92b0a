use super::record::{DynamicLevel, PersistedLevel};
use super::snapshot::SnapshotStore;
use crate::core::constants::{SPAWN_LEVEL_MAX, SPAWN_LEVEL_MIN};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Deterministic spawn level in `[1, 10]`, seeded from the id's high and low
/// 64 bits XORed together.
pub fn spawn_level_for(actor_id: Uuid) -> u32 {
    let bits = actor_id.as_u128();
    let seed = ((bits >> 64) as u64) ^ (bits as u64);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(SPAWN_LEVEL_MIN..=SPAWN_LEVEL_MAX)
}

/// Live dynamic levels, keyed by actor id.
#[derive(Debug, Default)]
pub struct DynamicLevelRegistry {
    levels: Mutex<HashMap<Uuid, DynamicLevel>>,
}

impl DynamicLevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic get-or-insert. A new record is restored from `snapshot` when it
    /// has an entry; otherwise `spawn_level` mints one and the snapshot gets a
    /// matching unlocked entry.
    pub fn get_or_create(
        &self,
        actor_id: Uuid,
        snapshot: &SnapshotStore,
        spawn_level: impl FnOnce() -> u32,
    ) -> DynamicLevel {
        let mut levels = self.lock();
        if let Some(record) = levels.get(&actor_id) {
            return *record;
        }

        let record = match snapshot.get(actor_id) {
            Some(persisted) => DynamicLevel::restored(&persisted),
            None => {
                let level = spawn_level();
                snapshot.put(
                    actor_id,
                    PersistedLevel {
                        spawn_level: level,
                        locked: false,
                    },
                );
                DynamicLevel::new(level)
            }
        };
        levels.insert(actor_id, record);
        record
    }

    pub fn get(&self, actor_id: Uuid) -> Option<DynamicLevel> {
        self.lock().get(&actor_id).copied()
    }

    /// Run `f` on the actor's record while the registry is locked. `None` if
    /// the actor is not registered.
    pub fn with<R>(&self, actor_id: Uuid, f: impl FnOnce(&mut DynamicLevel) -> R) -> Option<R> {
        self.lock().get_mut(&actor_id).map(f)
    }

    pub fn remove(&self, actor_id: Uuid) -> Option<DynamicLevel> {
        self.lock().remove(&actor_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, DynamicLevel>> {
        self.levels.lock().unwrap_or_else(|e| e.into_inner())
    }
}
