//! Crash-safe file mirror of the persisted dynamic levels.
//!
//! Every `put`/`remove` bumps a generation counter. `save` writes the map only
//! when the counter moved past the last saved generation, and marks the store
//! clean only up to the generation it actually wrote. A change that lands
//! while a save is in flight therefore stays dirty. Saves are serialized, so
//! two writers never share the temp file.

use super::record::PersistedLevel;
use crate::utils::persistence::{read_json, write_json_atomic};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    entries: Mutex<HashMap<Uuid, PersistedLevel>>,
    generation: AtomicU64,
    saved_generation: AtomicU64,
    save_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Empty store backed by `path`. Call [`SnapshotStore::load`] to read it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            saved_generation: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory map with the file's contents. A missing file
    /// yields an empty map; an unreadable or corrupt one is logged and also
    /// yields an empty map. Returns the number of entries loaded.
    pub fn load(&self) -> usize {
        let loaded: HashMap<Uuid, PersistedLevel> = match read_json(&self.path) {
            Ok(Some(entries)) => entries,
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(
                    "Failed to load dynamic levels from {}: {}; starting fresh",
                    self.path.display(),
                    e
                );
                HashMap::new()
            }
        };

        let count = loaded.len();
        *self.lock() = loaded;
        self.saved_generation
            .store(self.generation.load(Ordering::SeqCst), Ordering::SeqCst);
        info!("Loaded {} dynamic levels from {}", count, self.path.display());
        count
    }

    /// Write the map if it changed since the last save. Returns `false` only
    /// when a write was needed and failed.
    pub fn save(&self) -> bool {
        let _saving = self.save_lock.lock().unwrap_or_else(|e| e.into_inner());
        let generation = self.generation.load(Ordering::SeqCst);
        if generation == self.saved_generation.load(Ordering::SeqCst) {
            return true;
        }

        let sorted: BTreeMap<Uuid, PersistedLevel> =
            self.lock().iter().map(|(id, entry)| (*id, *entry)).collect();

        match write_json_atomic(&self.path, &sorted) {
            Ok(()) => {
                self.saved_generation.fetch_max(generation, Ordering::SeqCst);
                debug!("Saved {} dynamic levels", sorted.len());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to save dynamic levels to {}: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }

    pub fn get(&self, actor_id: Uuid) -> Option<PersistedLevel> {
        self.lock().get(&actor_id).copied()
    }

    pub fn put(&self, actor_id: Uuid, entry: PersistedLevel) {
        self.lock().insert(actor_id, entry);
        self.mark_dirty();
    }

    pub fn remove(&self, actor_id: Uuid) -> Option<PersistedLevel> {
        let removed = self.lock().remove(&actor_id);
        self.mark_dirty();
        removed
    }

    pub fn is_dirty(&self) -> bool {
        self.generation.load(Ordering::SeqCst) != self.saved_generation.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mark_dirty(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PersistedLevel>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
