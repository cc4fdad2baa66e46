//! Immutable Parameter Snapshots

use crate::Parameter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Site conditions observed alongside a reading (forecast covariates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConditions {
    /// Rainfall over the reading interval (mm)
    pub rainfall_mm: Option<f64>,
    /// Relative humidity (%)
    pub humidity_pct: Option<f64>,
    /// Upstream industrial activity index (0 = idle, 1 = full load)
    pub industrial_activity: Option<f64>,
}

/// One timestamped set of measured or predicted values for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    location_id: String,
    timestamp: DateTime<Utc>,
    values: BTreeMap<Parameter, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<SiteConditions>,
}

impl Snapshot {
    /// Create a snapshot from parameter values
    pub fn new(
        location_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        values: impl IntoIterator<Item = (Parameter, f64)>,
    ) -> Self {
        Self {
            location_id: location_id.into(),
            timestamp,
            values: values.into_iter().collect(),
            conditions: None,
        }
    }

    /// Attach site conditions
    pub fn with_conditions(mut self, conditions: SiteConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Value of a parameter, if measured
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    /// Measured values in parameter order
    pub fn values(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.values.iter().map(|(p, v)| (*p, *v))
    }

    pub fn conditions(&self) -> Option<&SiteConditions> {
        self.conditions.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accessors() {
        let ts = Utc::now();
        let snapshot = Snapshot::new(
            "kanpur-01",
            ts,
            [(Parameter::Ph, 7.4), (Parameter::DissolvedOxygen, 7.9)],
        );

        assert_eq!(snapshot.location_id(), "kanpur-01");
        assert_eq!(snapshot.timestamp(), ts);
        assert_eq!(snapshot.get(Parameter::Ph), Some(7.4));
        assert_eq!(snapshot.get(Parameter::Nitrate), None);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.conditions().is_none());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = Snapshot::new("varanasi-02", Utc::now(), [(Parameter::Turbidity, 12.0)])
            .with_conditions(SiteConditions {
                rainfall_mm: Some(4.5),
                ..Default::default()
            });

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["locationId"], "varanasi-02");
        assert_eq!(json["values"]["turbidity"], 12.0);
        assert_eq!(json["conditions"]["rainfallMm"], 4.5);

        let back: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
