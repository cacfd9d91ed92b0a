//! Comma-separated lookup files.
//!
//! Format shared by every table: one `key,value` pair per line, surrounding
//! whitespace trimmed, blank lines and `#` comments skipped, and an optional
//! header on the first non-empty line. Malformed lines are logged and skipped.

use crate::core::error::{LevelingError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// One data line split at its first comma.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedRow {
    /// 1-based line number in the source text
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Split `text` into rows. `header` is skipped (case-insensitively) only when
/// it is the first non-empty, non-comment line.
pub fn parse_delimited(text: &str, header: &str) -> Vec<DelimitedRow> {
    let mut rows = Vec::new();
    let mut first = true;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if first {
            first = false;
            if line.eq_ignore_ascii_case(header) {
                continue;
            }
        }

        let Some((key, value)) = line.split_once(',') else {
            warn!("Skipping invalid CSV line {}: {}", index + 1, line);
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            warn!("Skipping CSV line {} with empty key: {}", index + 1, line);
            continue;
        }

        rows.push(DelimitedRow {
            line: index + 1,
            key: key.to_string(),
            value: value.trim().to_string(),
        });
    }

    rows
}

/// Parse a row's value, logging and returning `None` when it is not a `T`.
pub fn parse_value<T: FromStr>(row: &DelimitedRow) -> Option<T> {
    match row.value.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(
                "Invalid value for {} on line {}: {}",
                row.key, row.line, row.value
            );
            None
        }
    }
}

/// `name,number` rows into a map. Later duplicates win. With `lowercase`,
/// keys are folded so lookups can ignore case.
pub fn parse_named<T: FromStr>(text: &str, header: &str, lowercase: bool) -> HashMap<String, T> {
    parse_delimited(text, header)
        .into_iter()
        .filter_map(|row| {
            let value = parse_value(&row)?;
            let key = if lowercase {
                row.key.to_lowercase()
            } else {
                row.key
            };
            Some((key, value))
        })
        .collect()
}

/// `level,number` rows keyed by level.
pub fn parse_by_level<T: FromStr>(text: &str, header: &str) -> BTreeMap<u32, T> {
    parse_delimited(text, header)
        .into_iter()
        .filter_map(|row| {
            let level = match row.key.parse::<u32>() {
                Ok(level) => level,
                Err(_) => {
                    warn!("Invalid level on line {}: {}", row.line, row.key);
                    return None;
                }
            };
            Some((level, parse_value(&row)?))
        })
        .collect()
}

/// Read `path`, first writing `default` there if the file does not exist.
pub fn read_or_create(path: &Path, default: &str) -> Result<String> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        info!("Creating default table at {}", path.display());
        fs::write(path, default)?;
    }
    Ok(fs::read_to_string(path)?)
}

/// Build the `xp_by_level` vector for a table formula from `level,xp` text.
/// Levels must run from 1 without gaps; index 0 is a zero placeholder.
pub fn level_table_from_str(text: &str) -> Result<Vec<u64>> {
    let by_level: BTreeMap<u32, u64> = parse_by_level(text, super::defaults::LEVELS_HEADER);
    if by_level.is_empty() {
        return Err(LevelingError::config("level table has no entries"));
    }

    let mut xp_by_level = vec![0];
    for (expected, (&level, &xp)) in (1u32..).zip(by_level.iter()) {
        if level != expected {
            return Err(LevelingError::config(format!(
                "level table must list every level from 1 (missing level {})",
                expected
            )));
        }
        xp_by_level.push(xp);
    }
    Ok(xp_by_level)
}

/// Load the table formula's CSV, creating the default file when missing.
pub fn load_level_table(path: &Path) -> Result<Vec<u64>> {
    let text = read_or_create(path, super::defaults::DEFAULT_LEVELS)?;
    let table = level_table_from_str(&text)?;
    info!(
        "Loaded level table from {} ({} levels)",
        path.display(),
        table.len() - 1
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_comments_and_blanks() {
        let text = "# zones\n\nZone,Lvl\nforest, 3\n  # tail\nswamp,7\n";
        let rows = parse_delimited(text, "zone,lvl");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "forest");
        assert_eq!(rows[0].value, "3");
        assert_eq!(rows[0].line, 4);
        assert_eq!(rows[1].key, "swamp");
    }

    #[test]
    fn test_header_only_skipped_on_first_line() {
        let rows = parse_delimited("a,1\nzone,lvl\n", "zone,lvl");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "no-comma\n,5\nok,1\n";
        let rows = parse_delimited(text, "zone,lvl");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "ok");
    }

    #[test]
    fn test_value_keeps_later_commas() {
        let rows = parse_delimited("5,sword,2", "lvl,itemnameid,quantity");
        assert_eq!(rows[0].value, "sword,2");
    }

    #[test]
    fn test_parse_named_lowercases_and_skips_bad_numbers() {
        let map: HashMap<String, u32> = parse_named("Forest,3\nCave,abc\n", "zone,lvl", true);
        assert_eq!(map.get("forest"), Some(&3));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_parse_by_level() {
        let map: BTreeMap<u32, u32> = parse_by_level("lvl,points\n1,5\nx,3\n10,8\n", "lvl,points");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&10), Some(&8));
    }

    #[test]
    fn test_level_table_from_str() {
        let table = level_table_from_str("level,xp\n1,0\n2,100\n3,300\n4,600\n").unwrap();
        assert_eq!(table, vec![0, 0, 100, 300, 600]);
    }

    #[test]
    fn test_level_table_gap_rejected() {
        let err = level_table_from_str("1,0\n2,100\n4,600\n").unwrap_err();
        assert!(matches!(err, LevelingError::Config(_)));
        assert!(level_table_from_str("# nothing\n").is_err());
    }

    #[test]
    fn test_load_level_table_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.csv");
        let table = load_level_table(&path).unwrap();
        assert!(path.exists());
        assert_eq!(table[1], 0);
        assert!(table.windows(2).skip(1).all(|w| w[0] <= w[1]));
    }
}
