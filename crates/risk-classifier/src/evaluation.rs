//! Classifier Verdicts

use crate::{Band, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use water_quality::Parameter;

/// Classification of a single parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReading {
    pub parameter: Parameter,
    pub value: f64,
    pub level: RiskLevel,
    /// Band that produced the level; `None` when no authored band matched
    pub band_matched: Option<Band>,
}

/// Classifier verdict on one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub overall: RiskLevel,
    pub readings: Vec<ParameterReading>,
    pub timestamp: DateTime<Utc>,
}

impl Evaluation {
    /// Whether every parameter sits at level 1
    pub fn is_normal(&self) -> bool {
        self.overall == RiskLevel::Normal
    }

    /// Readings above level 1, most severe first
    pub fn exceedances(&self) -> Vec<&ParameterReading> {
        let mut above: Vec<_> = self
            .readings
            .iter()
            .filter(|r| r.level > RiskLevel::Normal)
            .collect();
        above.sort_by(|a, b| b.level.cmp(&a.level));
        above
    }

    /// Most severe reading
    pub fn worst(&self) -> Option<&ParameterReading> {
        self.readings.iter().max_by_key(|r| r.level)
    }

    /// Reading for a parameter
    pub fn reading(&self, parameter: Parameter) -> Option<&ParameterReading> {
        self.readings.iter().find(|r| r.parameter == parameter)
    }
}
