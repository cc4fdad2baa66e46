//! Seasonal Adjustment

use crate::environment::CovariateSpread;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use water_quality::Parameter;

/// Hydrological season on the Indian subcontinent calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// June to September
    Monsoon,
    /// December to February
    Winter,
    /// March to May
    Summer,
    /// October and November
    PostMonsoon,
}

impl Season {
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            6..=9 => Season::Monsoon,
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Summer,
            _ => Season::PostMonsoon,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Season::Monsoon => "monsoon",
            Season::Winter => "winter",
            Season::Summer => "summer",
            Season::PostMonsoon => "post_monsoon",
        })
    }
}

/// Seasonal factors and confidence for one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonProfile {
    /// Multiplicative factor per parameter; absent parameters use 1.0
    pub factors: BTreeMap<Parameter, f64>,
    /// Season-wide base confidence (0-1)
    pub confidence: f64,
    /// Day-one covariate noise amplitude
    pub variability: CovariateSpread,
}

impl SeasonProfile {
    pub fn factor(&self, parameter: Parameter) -> f64 {
        self.factors.get(&parameter).copied().unwrap_or(1.0)
    }

    fn standard(factors: [f64; 6], confidence: f64, variability: CovariateSpread) -> Self {
        let parameters = [
            Parameter::DissolvedOxygen,
            Parameter::BiochemicalOxygenDemand,
            Parameter::Nitrate,
            Parameter::FecalColiform,
            Parameter::Ph,
            Parameter::Turbidity,
        ];
        Self {
            factors: parameters.into_iter().zip(factors).collect(),
            confidence,
            variability,
        }
    }
}

/// Profiles for all four seasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonTable {
    pub monsoon: SeasonProfile,
    pub winter: SeasonProfile,
    pub summer: SeasonProfile,
    pub post_monsoon: SeasonProfile,
}

impl SeasonTable {
    pub fn profile(&self, season: Season) -> &SeasonProfile {
        match season {
            Season::Monsoon => &self.monsoon,
            Season::Winter => &self.winter,
            Season::Summer => &self.summer,
            Season::PostMonsoon => &self.post_monsoon,
        }
    }
}

impl Default for SeasonTable {
    fn default() -> Self {
        // Factor order: DO, BOD, nitrate, fecal coliform, pH, turbidity
        Self {
            monsoon: SeasonProfile::standard(
                [0.90, 1.30, 1.20, 1.50, 0.95, 2.00],
                0.65,
                CovariateSpread::new(1.5, 20.0, 0.10),
            ),
            winter: SeasonProfile::standard(
                [1.15, 0.80, 0.90, 0.70, 1.02, 0.60],
                0.85,
                CovariateSpread::new(2.0, 2.0, 0.05),
            ),
            summer: SeasonProfile::standard(
                [0.85, 1.10, 1.10, 1.20, 0.98, 1.30],
                0.75,
                CovariateSpread::new(2.5, 5.0, 0.05),
            ),
            post_monsoon: SeasonProfile::standard(
                [1.05, 0.90, 0.95, 0.80, 1.01, 0.80],
                0.80,
                CovariateSpread::new(1.5, 8.0, 0.05),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(month: u32) -> Season {
        Season::from_date(NaiveDate::from_ymd_opt(2026, month, 15).unwrap())
    }

    #[test]
    fn test_calendar_bands() {
        assert_eq!(season(1), Season::Winter);
        assert_eq!(season(2), Season::Winter);
        assert_eq!(season(3), Season::Summer);
        assert_eq!(season(5), Season::Summer);
        assert_eq!(season(6), Season::Monsoon);
        assert_eq!(season(9), Season::Monsoon);
        assert_eq!(season(10), Season::PostMonsoon);
        assert_eq!(season(11), Season::PostMonsoon);
        assert_eq!(season(12), Season::Winter);
    }

    #[test]
    fn test_standard_factors() {
        let table = SeasonTable::default();
        let winter = table.profile(Season::Winter);
        assert_eq!(winter.factor(Parameter::DissolvedOxygen), 1.15);
        assert_eq!(winter.confidence, 0.85);
        assert_eq!(table.profile(Season::Monsoon).factor(Parameter::Turbidity), 2.0);
        // Parameters without a factor are unadjusted
        assert_eq!(winter.factor(Parameter::Conductivity), 1.0);
    }
}
