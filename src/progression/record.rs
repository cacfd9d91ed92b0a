use super::attributes::Attributes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable per-actor progression. Level is never stored; it is always derived
/// from `xp` through the active formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub actor_id: Uuid,
    pub xp: u64,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub ability_points: u32,
    #[serde(default)]
    pub used_ability_points: u32,
    /// Unix seconds of the last successful save, 0 if never saved
    #[serde(default)]
    pub last_save_time: i64,
}

impl ProgressionRecord {
    pub fn new(actor_id: Uuid) -> Self {
        Self {
            actor_id,
            xp: 0,
            attributes: Attributes::default(),
            ability_points: 0,
            used_ability_points: 0,
            last_save_time: 0,
        }
    }

    pub fn available_ability_points(&self) -> u32 {
        self.ability_points.saturating_sub(self.used_ability_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_zeroed() {
        let id = Uuid::new_v4();
        let record = ProgressionRecord::new(id);
        assert_eq!(record.actor_id, id);
        assert_eq!(record.xp, 0);
        assert_eq!(record.ability_points, 0);
        assert_eq!(record.available_ability_points(), 0);
    }

    #[test]
    fn test_available_never_negative() {
        let mut record = ProgressionRecord::new(Uuid::new_v4());
        record.ability_points = 3;
        record.used_ability_points = 5;
        assert_eq!(record.available_ability_points(), 0);
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"actor_id":"{}","xp":42}}"#, id);
        let record: ProgressionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.xp, 42);
        assert_eq!(record.used_ability_points, 0);
    }
}
