//! Environmental Covariates and Impact

use rand::Rng;
use serde::{Deserialize, Serialize};
use water_quality::{Parameter, Snapshot};

const DEFAULT_TEMPERATURE: f64 = 25.0;
const DEFAULT_RAINFALL: f64 = 0.0;
const DEFAULT_INDUSTRIAL: f64 = 0.5;
const DEFAULT_HUMIDITY: f64 = 70.0;
/// Humidity drift per √day at full noise (percentage points)
const HUMIDITY_SPREAD: f64 = 5.0;
const MAX_IMPACT: f64 = 0.5;

/// Conditions that drive water quality from outside the river
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Covariates {
    /// Water temperature (°C)
    pub temperature: f64,
    pub rainfall_mm: f64,
    /// 0 (idle) to 1 (full load)
    pub industrial_activity: f64,
    /// Relative humidity (%); reported only, no quality sensitivity
    pub humidity_pct: f64,
}

impl Covariates {
    /// Covariates observed with a snapshot, defaulting what was not measured
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let conditions = snapshot.conditions();
        Self {
            temperature: snapshot
                .get(Parameter::Temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            rainfall_mm: conditions
                .and_then(|c| c.rainfall_mm)
                .unwrap_or(DEFAULT_RAINFALL),
            industrial_activity: conditions
                .and_then(|c| c.industrial_activity)
                .unwrap_or(DEFAULT_INDUSTRIAL),
            humidity_pct: conditions
                .and_then(|c| c.humidity_pct)
                .unwrap_or(DEFAULT_HUMIDITY),
        }
    }

    /// Predicted covariates `day` days ahead
    ///
    /// Perturbation grows with the square root of the day offset; a zero
    /// `noise_scale` returns the latest values unchanged.
    pub fn project<R: Rng>(
        &self,
        spread: &CovariateSpread,
        day: u32,
        noise_scale: f64,
        rng: &mut R,
    ) -> Self {
        let amplitude = f64::from(day).sqrt() * noise_scale;
        let mut jitter = |width: f64| width * amplitude * rng.gen_range(-1.0f64..=1.0);

        Self {
            temperature: self.temperature + jitter(spread.temperature),
            rainfall_mm: (self.rainfall_mm + jitter(spread.rainfall_mm)).max(0.0),
            industrial_activity: (self.industrial_activity + jitter(spread.industrial_activity))
                .clamp(0.0, 1.0),
            humidity_pct: (self.humidity_pct + jitter(HUMIDITY_SPREAD)).clamp(0.0, 100.0),
        }
    }

    /// Component-wise change from a baseline
    pub fn delta(&self, baseline: &Covariates) -> Covariates {
        Covariates {
            temperature: self.temperature - baseline.temperature,
            rainfall_mm: self.rainfall_mm - baseline.rainfall_mm,
            industrial_activity: self.industrial_activity - baseline.industrial_activity,
            humidity_pct: self.humidity_pct - baseline.humidity_pct,
        }
    }
}

/// Noise amplitude per covariate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CovariateSpread {
    pub temperature: f64,
    pub rainfall_mm: f64,
    pub industrial_activity: f64,
}

impl CovariateSpread {
    pub const fn new(temperature: f64, rainfall_mm: f64, industrial_activity: f64) -> Self {
        Self {
            temperature,
            rainfall_mm,
            industrial_activity,
        }
    }
}

/// Sensitivity of a parameter to each covariate
struct Sensitivity {
    temperature: f64,
    rainfall: f64,
    industrial: f64,
}

fn sensitivity(parameter: Parameter) -> Option<Sensitivity> {
    let (temperature, rainfall, industrial) = match parameter {
        Parameter::DissolvedOxygen => (-0.02, 0.002, -0.10),
        Parameter::BiochemicalOxygenDemand => (0.03, 0.004, 0.25),
        Parameter::Nitrate => (0.01, 0.006, 0.20),
        Parameter::FecalColiform => (0.04, 0.010, 0.15),
        Parameter::Ph => (-0.002, -0.0005, -0.02),
        Parameter::Turbidity => (0.0, 0.015, 0.10),
        _ => return None,
    };
    Some(Sensitivity {
        temperature,
        rainfall,
        industrial,
    })
}

/// Relative adjustment from covariate changes, clamped to ±0.5
pub fn environmental_impact(parameter: Parameter, delta: &Covariates) -> f64 {
    sensitivity(parameter).map_or(0.0, |s| {
        (s.temperature * delta.temperature
            + s.rainfall * delta.rainfall_mm
            + s.industrial * delta.industrial_activity)
            .clamp(-MAX_IMPACT, MAX_IMPACT)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use water_quality::SiteConditions;

    #[test]
    fn test_defaults_and_observed() {
        let bare = Snapshot::new("kanpur-01", Utc::now(), [(Parameter::Ph, 7.0)]);
        let covariates = Covariates::from_snapshot(&bare);
        assert_eq!(covariates.temperature, 25.0);
        assert_eq!(covariates.rainfall_mm, 0.0);
        assert_eq!(covariates.industrial_activity, 0.5);
        assert_eq!(covariates.humidity_pct, 70.0);

        let observed = Snapshot::new("kanpur-01", Utc::now(), [(Parameter::Temperature, 18.0)])
            .with_conditions(SiteConditions {
                rainfall_mm: Some(12.0),
                industrial_activity: Some(0.9),
                humidity_pct: Some(85.0),
            });
        let covariates = Covariates::from_snapshot(&observed);
        assert_eq!(covariates.temperature, 18.0);
        assert_eq!(covariates.rainfall_mm, 12.0);
        assert_eq!(covariates.industrial_activity, 0.9);
        assert_eq!(covariates.humidity_pct, 85.0);
    }

    #[test]
    fn test_projection_without_noise_is_identity() {
        let base = Covariates {
            temperature: 20.0,
            rainfall_mm: 3.0,
            industrial_activity: 0.4,
            humidity_pct: 65.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let spread = CovariateSpread::new(2.0, 10.0, 0.1);
        assert_eq!(base.project(&spread, 5, 0.0, &mut rng), base);
    }

    #[test]
    fn test_projection_is_bounded() {
        let base = Covariates {
            temperature: 20.0,
            rainfall_mm: 0.0,
            industrial_activity: 0.98,
            humidity_pct: 99.0,
        };
        let spread = CovariateSpread::new(2.0, 10.0, 0.1);
        let mut rng = StdRng::seed_from_u64(42);
        for day in 1..=7 {
            let projected = base.project(&spread, day, 1.0, &mut rng);
            let limit = 2.0 * f64::from(day).sqrt();
            assert!((projected.temperature - 20.0).abs() <= limit);
            assert!(projected.rainfall_mm >= 0.0);
            assert!((0.0..=1.0).contains(&projected.industrial_activity));
            assert!((0.0..=100.0).contains(&projected.humidity_pct));
        }
    }

    #[test]
    fn test_impact_clamped() {
        let heavy_rain = Covariates {
            temperature: 0.0,
            rainfall_mm: 100.0,
            industrial_activity: 0.0,
            humidity_pct: 0.0,
        };
        assert_eq!(environmental_impact(Parameter::Turbidity, &heavy_rain), 0.5);
        assert!((environmental_impact(Parameter::BiochemicalOxygenDemand, &heavy_rain) - 0.4).abs() < 1e-12);
        assert_eq!(environmental_impact(Parameter::Conductivity, &heavy_rain), 0.0);

        let warmer = Covariates {
            temperature: 5.0,
            rainfall_mm: 0.0,
            industrial_activity: 0.0,
            humidity_pct: 40.0,
        };
        assert!((environmental_impact(Parameter::DissolvedOxygen, &warmer) + 0.1).abs() < 1e-12);
    }
}
