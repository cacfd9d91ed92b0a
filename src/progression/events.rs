//! Progression notifications and listener fan-out.
//!
//! Mutations collect [`ProgressionEvent`]s while the actor's record is locked;
//! the service dispatches them once the lock is released. Listeners therefore
//! always see persisted state and may call back into the service.

use super::attributes::{AttributeType, NUM_ATTRIBUTES};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// `(actor, old_level, new_level)`
pub type LevelListener = Arc<dyn Fn(Uuid, u32, u32) + Send + Sync>;
/// `(actor, amount)`
pub type XpListener = Arc<dyn Fn(Uuid, u64) + Send + Sync>;
/// `(actor, new_value)`
pub type AttributeListener = Arc<dyn Fn(Uuid, u32) + Send + Sync>;
pub type AbilityPointsListener = Arc<dyn Fn(Uuid, AbilityPointChange) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityPointChange {
    /// Total replaced.
    Set { total: u32 },
    /// Total increased by `amount`.
    Added { amount: u32, total: u32 },
    /// Spent counter replaced.
    UsedSet { used: u32 },
    /// `amount` points spent; `available` is what remains.
    Used { amount: u32, available: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionEvent {
    // ── Level ───────────────────────────────────────────────────
    LevelUp {
        actor_id: Uuid,
        old_level: u32,
        new_level: u32,
    },
    LevelDown {
        actor_id: Uuid,
        old_level: u32,
        new_level: u32,
    },

    // ── XP ──────────────────────────────────────────────────────
    /// Requested gain; fired even when the XP cap absorbed part of it.
    XpGain { actor_id: Uuid, amount: u64 },
    XpLoss { actor_id: Uuid, amount: u64 },

    // ── Attributes & ability points ─────────────────────────────
    AttributeChanged {
        actor_id: Uuid,
        attribute: AttributeType,
        value: u32,
    },
    AbilityPoints {
        actor_id: Uuid,
        change: AbilityPointChange,
    },
}

impl ProgressionEvent {
    /// Level transition event for `old -> new`, or `None` when equal.
    pub fn level_change(actor_id: Uuid, old_level: u32, new_level: u32) -> Option<Self> {
        if new_level > old_level {
            Some(ProgressionEvent::LevelUp {
                actor_id,
                old_level,
                new_level,
            })
        } else if new_level < old_level {
            Some(ProgressionEvent::LevelDown {
                actor_id,
                old_level,
                new_level,
            })
        } else {
            None
        }
    }
}

/// Registered observers, one list per event kind. Registration is additive
/// and permanent.
#[derive(Default)]
pub struct Listeners {
    level_up: RwLock<Vec<LevelListener>>,
    level_down: RwLock<Vec<LevelListener>>,
    xp_gain: RwLock<Vec<XpListener>>,
    xp_loss: RwLock<Vec<XpListener>>,
    attributes: RwLock<[Vec<AttributeListener>; NUM_ATTRIBUTES]>,
    ability_points: RwLock<Vec<AbilityPointsListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_level_up(&self, listener: LevelListener) {
        push(&self.level_up, listener);
    }

    pub fn on_level_down(&self, listener: LevelListener) {
        push(&self.level_down, listener);
    }

    pub fn on_xp_gain(&self, listener: XpListener) {
        push(&self.xp_gain, listener);
    }

    pub fn on_xp_loss(&self, listener: XpListener) {
        push(&self.xp_loss, listener);
    }

    pub fn on_attribute(&self, attribute: AttributeType, listener: AttributeListener) {
        let mut lists = self.attributes.write().unwrap_or_else(|e| e.into_inner());
        lists[attribute.index()].push(listener);
    }

    pub fn on_ability_points(&self, listener: AbilityPointsListener) {
        push(&self.ability_points, listener);
    }

    /// Deliver events in order. Listener lists are snapshotted before each
    /// call, so a callback may register further listeners.
    pub fn dispatch(&self, events: &[ProgressionEvent]) {
        for event in events {
            match *event {
                ProgressionEvent::LevelUp {
                    actor_id,
                    old_level,
                    new_level,
                } => {
                    for listener in snapshot(&self.level_up) {
                        listener(actor_id, old_level, new_level);
                    }
                }
                ProgressionEvent::LevelDown {
                    actor_id,
                    old_level,
                    new_level,
                } => {
                    for listener in snapshot(&self.level_down) {
                        listener(actor_id, old_level, new_level);
                    }
                }
                ProgressionEvent::XpGain { actor_id, amount } => {
                    for listener in snapshot(&self.xp_gain) {
                        listener(actor_id, amount);
                    }
                }
                ProgressionEvent::XpLoss { actor_id, amount } => {
                    for listener in snapshot(&self.xp_loss) {
                        listener(actor_id, amount);
                    }
                }
                ProgressionEvent::AttributeChanged {
                    actor_id,
                    attribute,
                    value,
                } => {
                    let listeners = {
                        let lists = self.attributes.read().unwrap_or_else(|e| e.into_inner());
                        lists[attribute.index()].clone()
                    };
                    for listener in listeners {
                        listener(actor_id, value);
                    }
                }
                ProgressionEvent::AbilityPoints { actor_id, change } => {
                    for listener in snapshot(&self.ability_points) {
                        listener(actor_id, change);
                    }
                }
            }
        }
    }
}

fn push<T>(list: &RwLock<Vec<T>>, item: T) {
    list.write().unwrap_or_else(|e| e.into_inner()).push(item);
}

fn snapshot<T: Clone>(list: &RwLock<Vec<T>>) -> Vec<T> {
    list.read().unwrap_or_else(|e| e.into_inner()).clone()
}
