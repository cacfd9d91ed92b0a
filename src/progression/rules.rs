//! Gameplay rules layered on the service: kill rewards, death penalties and
//! item level gates.

use super::service::ProgressionService;
use crate::core::config::{DeathConfig, KillXpConfig};
use crate::core::error::Result;
use crate::tables::LookupTables;
use uuid::Uuid;

/// XP for killing an NPC, or `None` when kill XP is disabled.
///
/// Uses the `xpmapping.csv` entry for `npc_type` when mappings are enabled and
/// one exists; otherwise `max(1, max_health * default_xp_gain_percentage)`.
pub fn kill_xp(
    config: &KillXpConfig,
    tables: &LookupTables,
    npc_type: &str,
    max_health: f32,
) -> Option<u64> {
    if !config.enabled {
        return None;
    }
    let from_health = ((max_health as f64) * config.default_xp_gain_percentage).max(1.0) as u64;
    if config.use_xp_mappings {
        Some(tables.xp_for_npc(npc_type).unwrap_or(from_health))
    } else {
        Some(from_health)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathPenalty {
    Disabled,
    /// Penalty applied; the level may or may not have changed.
    XpLost {
        amount: u64,
        old_level: u32,
        new_level: u32,
    },
    AllLevelsLost { old_level: u32 },
    /// Nothing lost: below the minimum level, already on the level floor, or
    /// the percentage rounded to zero.
    Protected { level: u32 },
}

/// Apply the configured death penalty to `actor_id`.
///
/// Checked in order: level-down mode removes a share of total XP (may drop
/// levels); all-levels-lost resets to level 1; otherwise actors at or above
/// `min_level_for_level_down` lose a share of XP but never fall below their
/// current level's floor. The read and the write happen under the actor's
/// record lock, so XP granted concurrently is never overwritten.
pub fn apply_death_penalty(
    service: &ProgressionService,
    config: &DeathConfig,
    actor_id: Uuid,
) -> Result<DeathPenalty> {
    if !config.enable_xp_loss_on_death {
        return Ok(DeathPenalty::Disabled);
    }

    let formula = service.formula();
    service.update_xp_with(actor_id, |xp, level| {
        let loss = ((xp as f64) * config.xp_loss_percentage).max(0.0) as u64;

        if config.enable_level_down_on_death {
            if loss == 0 {
                return Ok((None, DeathPenalty::Protected { level }));
            }
            let new_xp = xp.saturating_sub(loss);
            return Ok((
                Some(new_xp),
                DeathPenalty::XpLost {
                    amount: xp - new_xp,
                    old_level: level,
                    new_level: formula.level_for_xp(new_xp)?,
                },
            ));
        }

        if config.enable_all_levels_lost_on_death {
            return Ok((Some(0), DeathPenalty::AllLevelsLost { old_level: level }));
        }

        if level < config.min_level_for_level_down {
            return Ok((None, DeathPenalty::Protected { level }));
        }

        let floor = service.get_xp_for_level(level as i64)?;
        let new_xp = xp.saturating_sub(loss).max(floor);
        let amount = xp - new_xp;
        if amount == 0 {
            return Ok((None, DeathPenalty::Protected { level }));
        }
        Ok((
            Some(new_xp),
            DeathPenalty::XpLost {
                amount,
                old_level: level,
                new_level: level,
            },
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemGate {
    /// The item has no level requirement.
    Unrestricted,
    Allowed { required: u32 },
    Denied { required: u32 },
}

impl ItemGate {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, ItemGate::Denied { .. })
    }
}

pub fn check_item_requirement(tables: &LookupTables, item_id: &str, level: u32) -> ItemGate {
    match tables.item_level(item_id) {
        None => ItemGate::Unrestricted,
        Some(required) if level >= required => ItemGate::Allowed { required },
        Some(required) => ItemGate::Denied { required },
    }
}
