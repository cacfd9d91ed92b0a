//! Persistence port for player progression and the two bundled backends.

use super::record::ProgressionRecord;
use crate::core::constants::FORMULA_STAMP_FILE;
use crate::formula::FormulaDescriptor;
use crate::utils::persistence::{read_json, write_json_atomic};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

/// Key-value contract the service needs from a backend. `save` must be durable
/// when it returns; the service writes through on every mutation.
pub trait ProgressionStore: Send + Sync {
    fn load(&self, actor_id: Uuid) -> Result<Option<ProgressionRecord>, StoreError>;

    fn save(&self, record: &ProgressionRecord) -> Result<(), StoreError>;

    fn close(&self) -> Result<(), StoreError>;

    /// Every stored record. Only used by formula migration at startup.
    fn records(&self) -> Result<Vec<ProgressionRecord>, StoreError>;

    /// Formula the stored XP values were computed with, if any.
    fn formula_stamp(&self) -> Result<Option<FormulaDescriptor>, StoreError>;

    fn set_formula_stamp(&self, formula: &FormulaDescriptor) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<Uuid, ProgressionRecord>,
    stamp: Option<FormulaDescriptor>,
}

/// In-process store. Used by tests and the simulator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Backend("store is closed".to_string()));
        }
        Ok(())
    }
}

impl ProgressionStore for MemoryStore {
    fn load(&self, actor_id: Uuid) -> Result<Option<ProgressionRecord>, StoreError> {
        self.check_open()?;
        Ok(self.lock().records.get(&actor_id).cloned())
    }

    fn save(&self, record: &ProgressionRecord) -> Result<(), StoreError> {
        self.check_open()?;
        self.lock().records.insert(record.actor_id, record.clone());
        Ok(())
    }

    fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn records(&self) -> Result<Vec<ProgressionRecord>, StoreError> {
        self.check_open()?;
        Ok(self.lock().records.values().cloned().collect())
    }

    fn formula_stamp(&self) -> Result<Option<FormulaDescriptor>, StoreError> {
        self.check_open()?;
        Ok(self.lock().stamp.clone())
    }

    fn set_formula_stamp(&self, formula: &FormulaDescriptor) -> Result<(), StoreError> {
        self.check_open()?;
        self.lock().stamp = Some(formula.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per actor (`<uuid>.json`) plus `formula.json`,
/// all in a single directory. Writes go through a temp file and rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, actor_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", actor_id))
    }

    fn stamp_path(&self) -> PathBuf {
        self.dir.join(FORMULA_STAMP_FILE)
    }
}

impl ProgressionStore for JsonFileStore {
    fn load(&self, actor_id: Uuid) -> Result<Option<ProgressionRecord>, StoreError> {
        Ok(read_json(&self.record_path(actor_id))?)
    }

    fn save(&self, record: &ProgressionRecord) -> Result<(), StoreError> {
        Ok(write_json_atomic(&self.record_path(record.actor_id), record)?)
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn records(&self) -> Result<Vec<ProgressionRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
            if !is_record {
                continue;
            }
            if let Some(record) = read_json(&path)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn formula_stamp(&self) -> Result<Option<FormulaDescriptor>, StoreError> {
        Ok(read_json(&self.stamp_path())?)
    }

    fn set_formula_stamp(&self, formula: &FormulaDescriptor) -> Result<(), StoreError> {
        Ok(write_json_atomic(&self.stamp_path(), formula)?)
    }
}
