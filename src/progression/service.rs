//! Per-actor progression: XP, level, attributes and ability points.
//!
//! Records are read through a bounded LRU cache on first access and written
//! through to the [`ProgressionStore`] on every mutation. Each cached record
//! has its own mutex, so mutations of one actor run strictly one after another
//! while different actors proceed in parallel.
//!
//! Eviction drops only the LRU slot. Every handed-out entry is also tracked by
//! a weak handle, so an actor whose evicted entry is still held by a caller is
//! reattached to that same entry instead of being reloaded from the store. One
//! actor therefore never has two live records.

use super::attributes::AttributeType;
use super::events::{
    AbilityPointChange, AbilityPointsListener, AttributeListener, LevelListener, Listeners,
    ProgressionEvent, XpListener,
};
use super::record::ProgressionRecord;
use super::rewards::AbilityPointPolicy;
use super::store::ProgressionStore;
use crate::core::constants::MAX_XP;
use crate::core::error::{LevelingError, Result};
use crate::formula::LevelFormula;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use uuid::Uuid;

type Entry = Arc<Mutex<ProgressionRecord>>;

/// Bounded LRU plus weak handles to every entry still alive outside it.
struct RecordCache {
    lru: LruCache<Uuid, Entry>,
    live: HashMap<Uuid, Weak<Mutex<ProgressionRecord>>>,
}

impl RecordCache {
    fn new(capacity: NonZeroUsize) -> Self {
        Self {
            lru: LruCache::new(capacity),
            live: HashMap::new(),
        }
    }

    /// Cached entry, or an evicted one some caller still holds.
    fn get(&mut self, actor_id: Uuid) -> Option<Entry> {
        if let Some(entry) = self.lru.get(&actor_id) {
            return Some(entry.clone());
        }
        let entry = self.live.get(&actor_id)?.upgrade();
        match entry {
            Some(entry) => {
                self.lru.put(actor_id, entry.clone());
                Some(entry)
            }
            None => {
                self.live.remove(&actor_id);
                None
            }
        }
    }

    fn insert(&mut self, actor_id: Uuid, entry: Entry) {
        if self.live.len() >= self.lru.cap().get().saturating_mul(2) {
            self.live.retain(|_, weak| weak.strong_count() > 0);
        }
        self.live.insert(actor_id, Arc::downgrade(&entry));
        self.lru.put(actor_id, entry);
    }

    fn len(&self) -> usize {
        self.lru.len()
    }

    fn clear(&mut self) {
        self.lru.clear();
        self.live.clear();
    }
}

pub struct ProgressionService {
    formula: Arc<LevelFormula>,
    store: Arc<dyn ProgressionStore>,
    cache: Mutex<RecordCache>,
    listeners: Listeners,
}

impl ProgressionService {
    pub fn new(
        formula: Arc<LevelFormula>,
        store: Arc<dyn ProgressionStore>,
        cache_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            formula,
            store,
            cache: Mutex::new(RecordCache::new(capacity)),
            listeners: Listeners::new(),
        }
    }

    pub fn formula(&self) -> &Arc<LevelFormula> {
        &self.formula
    }

    pub fn store(&self) -> &Arc<dyn ProgressionStore> {
        &self.store
    }

    /// Number of records currently held in memory.
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Close the backing store. The service must not be used afterwards.
    pub fn close(&self) -> Result<()> {
        self.lock_cache().clear();
        Ok(self.store.close()?)
    }

    // ── Reads ───────────────────────────────────────────────────

    /// Copy of the actor's current record.
    pub fn record(&self, actor_id: Uuid) -> Result<ProgressionRecord> {
        let entry = self.entry(actor_id)?;
        let record = lock(&entry).clone();
        Ok(record)
    }

    pub fn get_xp(&self, actor_id: Uuid) -> Result<u64> {
        Ok(self.record(actor_id)?.xp)
    }

    pub fn get_level(&self, actor_id: Uuid) -> Result<u32> {
        self.formula.level_for_xp(self.get_xp(actor_id)?)
    }

    /// XP floor of `level`; 0 for level 1 and below.
    pub fn get_xp_for_level(&self, level: i64) -> Result<u64> {
        if level <= 1 {
            return Ok(0);
        }
        self.formula
            .xp_for_level(level.min(u32::MAX as i64) as u32)
    }

    pub fn get_attribute(&self, actor_id: Uuid, attribute: AttributeType) -> Result<u32> {
        Ok(self.record(actor_id)?.attributes.get(attribute))
    }

    pub fn get_ability_points(&self, actor_id: Uuid) -> Result<u32> {
        Ok(self.record(actor_id)?.ability_points)
    }

    pub fn get_used_ability_points(&self, actor_id: Uuid) -> Result<u32> {
        Ok(self.record(actor_id)?.used_ability_points)
    }

    pub fn get_available_ability_points(&self, actor_id: Uuid) -> Result<u32> {
        Ok(self.record(actor_id)?.available_ability_points())
    }

    // ── XP & level ──────────────────────────────────────────────

    /// Replace the actor's XP. Negative values clamp to 0, values above
    /// [`MAX_XP`] clamp to it.
    pub fn set_xp(&self, actor_id: Uuid, xp: i64) -> Result<()> {
        let xp = (xp.max(0) as u64).min(MAX_XP);
        self.update(actor_id, |record, events| {
            self.write_xp(record, xp, events)?;
            Ok(())
        })
    }

    pub fn add_xp(&self, actor_id: Uuid, amount: u64) -> Result<()> {
        self.update(actor_id, |record, events| {
            let xp = record.xp.saturating_add(amount).min(MAX_XP);
            events.push(ProgressionEvent::XpGain { actor_id, amount });
            self.write_xp(record, xp, events)?;
            Ok(())
        })
    }

    pub fn remove_xp(&self, actor_id: Uuid, amount: u64) -> Result<()> {
        self.update(actor_id, |record, events| {
            let xp = record.xp.saturating_sub(amount);
            events.push(ProgressionEvent::XpLoss { actor_id, amount });
            self.write_xp(record, xp, events)?;
            Ok(())
        })
    }

    /// Read-modify-write of the actor's XP under its record lock. `decide`
    /// gets the current XP and level and returns the new XP (`None` keeps it)
    /// plus a value passed back to the caller. A drop in XP fires an XP loss
    /// event.
    pub(crate) fn update_xp_with<R>(
        &self,
        actor_id: Uuid,
        decide: impl FnOnce(u64, u32) -> Result<(Option<u64>, R)>,
    ) -> Result<R> {
        self.update(actor_id, |record, events| {
            let level = self.formula.level_for_xp(record.xp)?;
            let (new_xp, value) = decide(record.xp, level)?;
            if let Some(xp) = new_xp.map(|xp| xp.min(MAX_XP)) {
                if xp < record.xp {
                    events.push(ProgressionEvent::XpLoss {
                        actor_id,
                        amount: record.xp - xp,
                    });
                }
                self.write_xp(record, xp, events)?;
            }
            Ok(value)
        })
    }

    /// Move the actor to the XP floor of `level` (clamped into
    /// `[1, max_level]`). Returns the resulting level.
    pub fn set_level(&self, actor_id: Uuid, level: i64) -> Result<u32> {
        self.update(actor_id, |record, events| {
            self.write_level(record, level, events)
        })
    }

    /// Shift the actor's level by `delta` (negative lowers it). Zero is a no-op.
    pub fn add_level(&self, actor_id: Uuid, delta: i64) -> Result<u32> {
        if delta == 0 {
            return self.get_level(actor_id);
        }
        self.update(actor_id, |record, events| {
            let current = self.formula.level_for_xp(record.xp)? as i64;
            self.write_level(record, current.saturating_add(delta), events)
        })
    }

    /// Lower the actor's level by `delta`, never below 1. `delta` must be positive.
    pub fn remove_level(&self, actor_id: Uuid, delta: i64) -> Result<u32> {
        if delta <= 0 {
            return Err(LevelingError::invalid_argument(format!(
                "levels to remove must be greater than 0 (got {})",
                delta
            )));
        }
        self.update(actor_id, |record, events| {
            let current = self.formula.level_for_xp(record.xp)? as i64;
            self.write_level(record, current - delta, events)
        })
    }

    // ── Attributes ──────────────────────────────────────────────

    pub fn set_attribute(&self, actor_id: Uuid, attribute: AttributeType, value: u32) -> Result<()> {
        self.update(actor_id, |record, events| {
            record.attributes.set(attribute, value);
            events.push(ProgressionEvent::AttributeChanged {
                actor_id,
                attribute,
                value,
            });
            Ok(())
        })
    }

    // ── Ability points ──────────────────────────────────────────

    pub fn set_ability_points(&self, actor_id: Uuid, total: u32) -> Result<()> {
        self.update(actor_id, |record, events| {
            record.ability_points = total;
            events.push(ability_points(actor_id, AbilityPointChange::Set { total }));
            Ok(())
        })
    }

    /// Grant extra points. Non-positive amounts are ignored.
    pub fn add_ability_points(&self, actor_id: Uuid, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let amount = amount.min(u32::MAX as i64) as u32;
        self.update(actor_id, |record, events| {
            record.ability_points = record.ability_points.saturating_add(amount);
            events.push(ability_points(
                actor_id,
                AbilityPointChange::Added {
                    amount,
                    total: record.ability_points,
                },
            ));
            Ok(())
        })
    }

    pub fn set_used_ability_points(&self, actor_id: Uuid, used: u32) -> Result<()> {
        self.update(actor_id, |record, events| {
            record.used_ability_points = used;
            events.push(ability_points(actor_id, AbilityPointChange::UsedSet { used }));
            Ok(())
        })
    }

    /// Spend `amount` points. Returns `false` and changes nothing when
    /// `amount <= 0` or more than the available points are requested.
    pub fn use_ability_points(&self, actor_id: Uuid, amount: i64) -> Result<bool> {
        if amount <= 0 {
            return Ok(false);
        }
        self.update(actor_id, |record, events| {
            let available = record.available_ability_points();
            if amount > available as i64 {
                return Ok(false);
            }
            let amount = amount as u32;
            record.used_ability_points += amount;
            events.push(ability_points(
                actor_id,
                AbilityPointChange::Used {
                    amount,
                    available: record.available_ability_points(),
                },
            ));
            Ok(true)
        })
    }

    /// Reset every spent point and attribute, granting `total` fresh points.
    pub fn respec(&self, actor_id: Uuid, total: u32) -> Result<()> {
        self.update(actor_id, |record, events| {
            record.ability_points = total;
            record.used_ability_points = 0;
            events.push(ability_points(actor_id, AbilityPointChange::Set { total }));
            events.push(ability_points(actor_id, AbilityPointChange::UsedSet { used: 0 }));
            for attribute in AttributeType::all() {
                if record.attributes.get(attribute) != 0 {
                    record.attributes.set(attribute, 0);
                    events.push(ProgressionEvent::AttributeChanged {
                        actor_id,
                        attribute,
                        value: 0,
                    });
                }
            }
            Ok(())
        })
    }

    /// Bring the ability point total in line with the actor's current level,
    /// e.g. when a session starts after the per-level table changed. Returns
    /// whether the total was changed.
    pub fn reconcile_ability_points(&self, actor_id: Uuid, policy: &AbilityPointPolicy) -> Result<bool> {
        self.update(actor_id, |record, events| {
            let level = self.formula.level_for_xp(record.xp)?;
            let total = policy.total_for_level(level);
            if record.ability_points == total {
                return Ok(false);
            }
            record.ability_points = total;
            events.push(ability_points(actor_id, AbilityPointChange::Set { total }));
            Ok(true)
        })
    }

    // ── Listener registration ───────────────────────────────────

    pub fn register_level_up_listener<F>(&self, listener: F)
    where
        F: Fn(Uuid, u32, u32) + Send + Sync + 'static,
    {
        self.listeners.on_level_up(Arc::new(listener) as LevelListener);
    }

    pub fn register_level_down_listener<F>(&self, listener: F)
    where
        F: Fn(Uuid, u32, u32) + Send + Sync + 'static,
    {
        self.listeners.on_level_down(Arc::new(listener) as LevelListener);
    }

    pub fn register_xp_gain_listener<F>(&self, listener: F)
    where
        F: Fn(Uuid, u64) + Send + Sync + 'static,
    {
        self.listeners.on_xp_gain(Arc::new(listener) as XpListener);
    }

    pub fn register_xp_loss_listener<F>(&self, listener: F)
    where
        F: Fn(Uuid, u64) + Send + Sync + 'static,
    {
        self.listeners.on_xp_loss(Arc::new(listener) as XpListener);
    }

    pub fn register_attribute_listener<F>(&self, attribute: AttributeType, listener: F)
    where
        F: Fn(Uuid, u32) + Send + Sync + 'static,
    {
        self.listeners
            .on_attribute(attribute, Arc::new(listener) as AttributeListener);
    }

    pub fn register_ability_points_listener<F>(&self, listener: F)
    where
        F: Fn(Uuid, AbilityPointChange) + Send + Sync + 'static,
    {
        self.listeners
            .on_ability_points(Arc::new(listener) as AbilityPointsListener);
    }

    // ── Internals ───────────────────────────────────────────────

    /// Atomic get-or-create: the store is consulted under the cache lock, and
    /// only when no live entry exists, so two callers never mint separate
    /// records for the same actor.
    fn entry(&self, actor_id: Uuid) -> Result<Entry> {
        let mut cache = self.lock_cache();
        if let Some(entry) = cache.get(actor_id) {
            return Ok(entry);
        }

        let record = self
            .store
            .load(actor_id)?
            .unwrap_or_else(|| ProgressionRecord::new(actor_id));
        let entry = Arc::new(Mutex::new(record));
        cache.insert(actor_id, entry.clone());
        Ok(entry)
    }

    /// Run one read-compute-persist step with the actor's record locked, then
    /// dispatch the collected events after unlocking.
    ///
    /// The record is saved only if it changed. On any error the cached copy is
    /// restored, so cache and store never disagree.
    fn update<R>(
        &self,
        actor_id: Uuid,
        mutate: impl FnOnce(&mut ProgressionRecord, &mut Vec<ProgressionEvent>) -> Result<R>,
    ) -> Result<R> {
        let entry = self.entry(actor_id)?;
        let mut events = Vec::new();

        let result = {
            let mut record = lock(&entry);
            let before = record.clone();

            let outcome = mutate(&mut record, &mut events).and_then(|value| {
                if *record != before {
                    record.last_save_time = chrono::Utc::now().timestamp();
                    self.store.save(&record)?;
                }
                Ok(value)
            });
            if outcome.is_err() {
                *record = before;
            }
            outcome?
        };

        self.listeners.dispatch(&events);
        Ok(result)
    }

    fn write_xp(
        &self,
        record: &mut ProgressionRecord,
        xp: u64,
        events: &mut Vec<ProgressionEvent>,
    ) -> Result<u32> {
        let old_level = self.formula.level_for_xp(record.xp)?;
        record.xp = xp;
        let new_level = self.formula.level_for_xp(xp)?;
        events.extend(ProgressionEvent::level_change(
            record.actor_id,
            old_level,
            new_level,
        ));
        Ok(new_level)
    }

    fn write_level(
        &self,
        record: &mut ProgressionRecord,
        level: i64,
        events: &mut Vec<ProgressionEvent>,
    ) -> Result<u32> {
        let target = level.clamp(1, self.formula.max_level() as i64);
        let xp = self.get_xp_for_level(target)?;
        self.write_xp(record, xp, events)
    }

    fn lock_cache(&self) -> MutexGuard<'_, RecordCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn lock(entry: &Entry) -> MutexGuard<'_, ProgressionRecord> {
    entry.lock().unwrap_or_else(|e| e.into_inner())
}

fn ability_points(actor_id: Uuid, change: AbilityPointChange) -> ProgressionEvent {
    ProgressionEvent::AbilityPoints { actor_id, change }
}
