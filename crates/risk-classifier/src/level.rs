//! Five-Level Risk Scale

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level from 1 (normal) to 5 (emergency)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RiskLevel {
    Normal = 1,
    Advisory = 2,
    Warning = 3,
    Critical = 4,
    Emergency = 5,
}

struct LevelInfo {
    name: &'static str,
    label: &'static str,
    description: &'static str,
}

const LEVEL_INFO: [LevelInfo; 5] = [
    LevelInfo {
        name: "NORMAL",
        label: "Normal",
        description: "Water quality is within acceptable limits",
    },
    LevelInfo {
        name: "ADVISORY",
        label: "Advisory",
        description: "Minor deviation from normal parameters",
    },
    LevelInfo {
        name: "WARNING",
        label: "Warning",
        description: "Moderate concern requiring attention",
    },
    LevelInfo {
        name: "CRITICAL",
        label: "Critical",
        description: "Serious water quality issue requiring immediate action",
    },
    LevelInfo {
        name: "EMERGENCY",
        label: "Emergency",
        description: "Severe contamination posing immediate health risks",
    },
];

impl RiskLevel {
    /// All levels, mildest first
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Normal,
        RiskLevel::Advisory,
        RiskLevel::Warning,
        RiskLevel::Critical,
        RiskLevel::Emergency,
    ];

    /// Numeric value (1-5)
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Level from its numeric value
    pub fn from_value(value: u8) -> Option<Self> {
        RiskLevel::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    /// Next milder level, `None` for `Normal`
    pub fn milder(self) -> Option<Self> {
        Self::from_value(self.value() - 1)
    }

    fn info(self) -> &'static LevelInfo {
        &LEVEL_INFO[self.index()]
    }

    /// Zero-based index into per-level tables
    pub fn index(self) -> usize {
        usize::from(self.value() - 1)
    }

    /// Upper-case status name (e.g. `WARNING`)
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Display label (e.g. `Warning`)
    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Normal
    }
}

impl TryFrom<u8> for RiskLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("risk level {} is outside 1-5", value))
    }
}

impl From<RiskLevel> for u8 {
    fn from(level: RiskLevel) -> Self {
        level.value()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_values() {
        for (i, level) in RiskLevel::ALL.iter().enumerate() {
            assert_eq!(level.value() as usize, i + 1);
            assert_eq!(RiskLevel::from_value(level.value()), Some(*level));
        }
        assert_eq!(RiskLevel::from_value(0), None);
        assert_eq!(RiskLevel::from_value(6), None);
    }

    #[test]
    fn test_ordering_and_milder() {
        assert!(RiskLevel::Emergency > RiskLevel::Warning);
        assert_eq!(RiskLevel::Warning.milder(), Some(RiskLevel::Advisory));
        assert_eq!(RiskLevel::Normal.milder(), None);
    }

    #[test]
    fn test_serde_as_number() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "4");
        let level: RiskLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, RiskLevel::Warning);
        assert!(serde_json::from_str::<RiskLevel>("9").is_err());
    }

    #[test]
    fn test_level_names() {
        assert_eq!(RiskLevel::Normal.name(), "NORMAL");
        assert_eq!(RiskLevel::Emergency.label(), "Emergency");
    }
}
