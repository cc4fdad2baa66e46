//! Forecast Records

use crate::environment::Covariates;
use crate::trend::TrendLabel;
use chrono::{DateTime, NaiveDate, Utc};
use risk_classifier::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use water_quality::Parameter;

/// Predicted class of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Good,
    Moderate,
    Poor,
}

impl StatusClass {
    pub fn from_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Normal => StatusClass::Good,
            RiskLevel::Advisory => StatusClass::Moderate,
            _ => StatusClass::Poor,
        }
    }

    /// Score used in the quality index
    pub fn score(self) -> f64 {
        match self {
            StatusClass::Good => 85.0,
            StatusClass::Moderate => 60.0,
            StatusClass::Poor => 30.0,
        }
    }
}

/// Overall predicted water quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl QualityStatus {
    pub fn from_index(index: f64) -> Self {
        if index >= 90.0 {
            QualityStatus::Excellent
        } else if index >= 70.0 {
            QualityStatus::Good
        } else if index >= 50.0 {
            QualityStatus::Moderate
        } else if index >= 25.0 {
            QualityStatus::Poor
        } else {
            QualityStatus::VeryPoor
        }
    }
}

/// Severity of a forecast alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSeverity {
    Low,
    Medium,
    High,
}

/// Predicted deterioration worth flagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastAlert {
    pub day: u32,
    pub parameter: Parameter,
    pub severity: ForecastSeverity,
    pub message: String,
    pub recommended_action: String,
}

/// One parameter on one forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterForecast {
    pub predicted: f64,
    /// 40-95
    pub confidence: f64,
    pub trend: TrendLabel,
    /// Relative environmental adjustment applied (±0.5)
    pub impact: f64,
    pub level: RiskLevel,
    pub status: StatusClass,
}

/// Forecast for one day ahead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub date: NaiveDate,
    pub day_offset: u32,
    pub parameters: BTreeMap<Parameter, ParameterForecast>,
    pub conditions: Covariates,
    pub quality_index: f64,
    pub status: QualityStatus,
    pub alerts: Vec<ForecastAlert>,
}

/// Forecasting model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub algorithm: String,
    pub version: String,
    /// Nominal accuracy (%)
    pub accuracy: f64,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            algorithm: "multi-factor-trend".to_string(),
            version: "2.0".to_string(),
            accuracy: 78.0,
        }
    }
}

/// Multi-day forecast for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub id: Uuid,
    pub location_id: String,
    /// Day the forecast was generated for
    pub forecast_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub predictions: Vec<Prediction>,
    pub model: ModelInfo,
    /// Alerts from every prediction, in day order
    pub alerts: Vec<ForecastAlert>,
}

impl Forecast {
    /// Prediction for a day offset (1-based)
    pub fn day(&self, offset: u32) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.day_offset == offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_index() {
        assert_eq!(QualityStatus::from_index(95.0), QualityStatus::Excellent);
        assert_eq!(QualityStatus::from_index(85.0), QualityStatus::Good);
        assert_eq!(QualityStatus::from_index(70.0), QualityStatus::Good);
        assert_eq!(QualityStatus::from_index(55.0), QualityStatus::Moderate);
        assert_eq!(QualityStatus::from_index(30.0), QualityStatus::Poor);
        assert_eq!(QualityStatus::from_index(10.0), QualityStatus::VeryPoor);
    }

    #[test]
    fn test_class_from_level() {
        assert_eq!(StatusClass::from_level(RiskLevel::Normal), StatusClass::Good);
        assert_eq!(StatusClass::from_level(RiskLevel::Advisory), StatusClass::Moderate);
        assert_eq!(StatusClass::from_level(RiskLevel::Warning), StatusClass::Poor);
        assert_eq!(StatusClass::from_level(RiskLevel::Emergency), StatusClass::Poor);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&QualityStatus::VeryPoor).unwrap();
        assert_eq!(json, "\"very_poor\"");
        assert_eq!(ModelInfo::default().algorithm, "multi-factor-trend");
    }
}
