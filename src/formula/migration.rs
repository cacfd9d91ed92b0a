//! Rewrites stored XP when the active formula changes so every actor keeps the
//! level they had earned.

use super::curve::LevelFormula;
use super::types::FormulaDescriptor;
use crate::core::error::Result;
use crate::progression::store::ProgressionStore;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub rewritten: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No formula was stamped yet; the current one was recorded.
    FirstRun,
    Unchanged,
    Migrated(MigrationReport),
}

/// Map every record's XP through `previous` -> level -> `next`.
///
/// Progress inside a level is not kept: each actor lands on the XP floor of
/// their old level under the new curve. Records whose XP would not change are
/// left untouched.
pub fn migrate_records(
    store: &dyn ProgressionStore,
    previous: &LevelFormula,
    next: &LevelFormula,
) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();

    for mut record in store.records()? {
        report.scanned += 1;
        let level = previous.level_for_xp(record.xp)?;
        let xp = next.xp_for_level(level)?;
        if xp == record.xp {
            continue;
        }

        debug!(
            "Migrating {}: level {} xp {} -> {}",
            record.actor_id, level, record.xp, xp
        );
        record.xp = xp;
        store.save(&record)?;
        report.rewritten += 1;
    }

    Ok(report)
}

/// Compare `current` with the formula stamped in the store and migrate when
/// they differ. Running it twice in a row is a no-op the second time.
pub fn migrate_if_needed(
    store: &dyn ProgressionStore,
    current: &FormulaDescriptor,
) -> Result<MigrationOutcome> {
    let next = current.build()?;

    let previous = match store.formula_stamp()? {
        Some(previous) => previous,
        None => {
            store.set_formula_stamp(current)?;
            info!("Recorded initial {} formula", next.name());
            return Ok(MigrationOutcome::FirstRun);
        }
    };

    if previous.fingerprint()? == current.fingerprint()? {
        return Ok(MigrationOutcome::Unchanged);
    }

    let old = previous.build()?;
    info!(
        "Formula changed ({} -> {}), migrating stored XP",
        old.name(),
        next.name()
    );
    let report = migrate_records(store, &old, &next)?;
    store.set_formula_stamp(current)?;
    info!(
        "Formula migration done: {} scanned, {} rewritten",
        report.scanned, report.rewritten
    );

    Ok(MigrationOutcome::Migrated(report))
}
