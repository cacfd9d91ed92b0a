use tracing::warn;

/// Strategy used to recompute a non-player actor's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelMode {
    /// Keep the spawn level forever
    SpawnOnly,
    /// Mean level of players within the nearby radius
    #[default]
    NearbyPlayersMean,
    Zone,
    Biome,
    Instance,
}

impl LevelMode {
    pub fn all() -> [LevelMode; 5] {
        [
            LevelMode::SpawnOnly,
            LevelMode::NearbyPlayersMean,
            LevelMode::Zone,
            LevelMode::Biome,
            LevelMode::Instance,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LevelMode::SpawnOnly => "SPAWN_ONLY",
            LevelMode::NearbyPlayersMean => "NEARBY_PLAYERS_MEAN",
            LevelMode::Zone => "ZONE",
            LevelMode::Biome => "BIOME",
            LevelMode::Instance => "INSTANCE",
        }
    }

    /// Case-insensitive; `-` and spaces count as `_`.
    pub fn parse(value: &str) -> Option<LevelMode> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        LevelMode::all()
            .into_iter()
            .find(|mode| mode.name() == normalized)
    }

    /// Like [`LevelMode::parse`], falling back to the default with a warning.
    pub fn from_config(value: &str) -> LevelMode {
        LevelMode::parse(value).unwrap_or_else(|| {
            let fallback = LevelMode::default();
            warn!(
                "Unknown level mode {:?}, defaulting to {}",
                value,
                fallback.name()
            );
            fallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(LevelMode::parse("zone"), Some(LevelMode::Zone));
        assert_eq!(LevelMode::parse(" Spawn_Only "), Some(LevelMode::SpawnOnly));
        assert_eq!(
            LevelMode::parse("nearby-players-mean"),
            Some(LevelMode::NearbyPlayersMean)
        );
        assert_eq!(LevelMode::parse("random"), None);
    }

    #[test]
    fn test_unknown_falls_back_to_default() {
        assert_eq!(LevelMode::from_config("???"), LevelMode::NearbyPlayersMean);
        assert_eq!(LevelMode::from_config("BIOME"), LevelMode::Biome);
    }

    #[test]
    fn test_names_roundtrip() {
        for mode in LevelMode::all() {
            assert_eq!(LevelMode::parse(mode.name()), Some(mode));
        }
    }
}
