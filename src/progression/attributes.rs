use serde::{Deserialize, Serialize};

pub const NUM_ATTRIBUTES: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Strength,
    Agility,
    Perception,
    Vitality,
    Intelligence,
    Constitution,
}

impl AttributeType {
    pub fn all() -> [AttributeType; NUM_ATTRIBUTES] {
        [
            AttributeType::Strength,
            AttributeType::Agility,
            AttributeType::Perception,
            AttributeType::Vitality,
            AttributeType::Intelligence,
            AttributeType::Constitution,
        ]
    }

    pub fn abbrev(&self) -> &str {
        match self {
            AttributeType::Strength => "STR",
            AttributeType::Agility => "AGI",
            AttributeType::Perception => "PER",
            AttributeType::Vitality => "VIT",
            AttributeType::Intelligence => "INT",
            AttributeType::Constitution => "CON",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AttributeType::Strength => 0,
            AttributeType::Agility => 1,
            AttributeType::Perception => 2,
            AttributeType::Vitality => 3,
            AttributeType::Intelligence => 4,
            AttributeType::Constitution => 5,
        }
    }

    /// Parse an abbreviation or full name, ignoring case.
    pub fn parse(value: &str) -> Option<AttributeType> {
        let value = value.trim();
        AttributeType::all().into_iter().find(|attr| {
            attr.abbrev().eq_ignore_ascii_case(value)
                || format!("{:?}", attr).eq_ignore_ascii_case(value)
        })
    }
}

/// Six independent counters, all starting at 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attributes {
    values: [u32; NUM_ATTRIBUTES],
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: AttributeType) -> u32 {
        self.values[attr.index()]
    }

    pub fn set(&mut self, attr: AttributeType, value: u32) {
        self.values[attr.index()] = value;
    }

    pub fn increment(&mut self, attr: AttributeType) {
        self.values[attr.index()] = self.values[attr.index()].saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| v as u64).sum()
    }
}
