//! Authored Threshold Bands

use crate::{RiskLevel, ThresholdError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use water_quality::{Direction, Parameter};

/// Inclusive value band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive membership test
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Whether `inner` lies entirely within this band
    pub fn encloses(&self, inner: &Band) -> bool {
        self.min <= inner.min && self.max >= inner.max
    }

    /// Band midpoint
    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Threshold specification for one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub name: String,
    pub unit: String,
    pub direction: Direction,
    /// Bands indexed by risk level 1-5
    pub bands: [Band; 5],
}

impl ParameterSpec {
    /// Spec using the parameter's standard name, unit, and direction
    pub fn standard(parameter: Parameter, bands: [(f64, f64); 5]) -> Self {
        Self {
            parameter,
            name: parameter.display_name().to_string(),
            unit: parameter.unit().to_string(),
            direction: parameter.direction(),
            bands: bands.map(|(min, max)| Band::new(min, max)),
        }
    }

    /// Band authored for a level
    pub fn band(&self, level: RiskLevel) -> Band {
        self.bands[level.index()]
    }

    /// Check band ordering and nesting against the direction tag
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for level in RiskLevel::ALL {
            let band = self.band(level);
            if !(band.min <= band.max) {
                return Err(ThresholdError::InvertedBand {
                    parameter: self.parameter,
                    level: level.value(),
                    min: band.min,
                    max: band.max,
                });
            }
        }

        for i in 0..self.bands.len() - 1 {
            let inner = &self.bands[i];
            let outer = &self.bands[i + 1];
            let level = i as u8 + 1;
            if !outer.encloses(inner) || outer == inner {
                return Err(ThresholdError::NotNested {
                    parameter: self.parameter,
                    level,
                    outer: level + 1,
                });
            }

            let consistent = match self.direction {
                Direction::HigherIsWorse => outer.min == inner.min,
                Direction::LowerIsWorse => outer.max == inner.max,
                Direction::CenteredIsBest => true,
            };
            if !consistent {
                return Err(ThresholdError::DirectionMismatch {
                    parameter: self.parameter,
                    direction: self.direction,
                });
            }
        }

        Ok(())
    }
}

/// Validated set of parameter specs
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    specs: BTreeMap<Parameter, ParameterSpec>,
}

impl ThresholdTable {
    /// Build a table, rejecting malformed or duplicate specs
    pub fn new(specs: impl IntoIterator<Item = ParameterSpec>) -> Result<Self, ThresholdError> {
        let mut map = BTreeMap::new();
        for spec in specs {
            spec.validate()?;
            let parameter = spec.parameter;
            if map.insert(parameter, spec).is_some() {
                return Err(ThresholdError::Duplicate(parameter));
            }
        }
        Ok(Self { specs: map })
    }

    /// The standard five-level table for river monitoring
    pub fn standard() -> Self {
        let specs = STANDARD_BANDS
            .iter()
            .map(|(parameter, bands)| ParameterSpec::standard(*parameter, *bands));
        Self {
            specs: specs.map(|s| (s.parameter, s)).collect(),
        }
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterSpec> {
        self.specs.get(&parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl Serialize for ThresholdTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.specs.values())
    }
}

impl<'de> Deserialize<'de> for ThresholdTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let specs = Vec::<ParameterSpec>::deserialize(deserializer)?;
        ThresholdTable::new(specs).map_err(serde::de::Error::custom)
    }
}

type BandRow = (Parameter, [(f64, f64); 5]);

const STANDARD_BANDS: [BandRow; 11] = [
    (
        Parameter::Ph,
        [(6.5, 8.5), (6.0, 9.0), (5.5, 9.5), (4.5, 10.5), (0.0, 14.0)],
    ),
    (
        Parameter::DissolvedOxygen,
        [(6.0, 20.0), (4.0, 20.0), (2.0, 20.0), (1.0, 20.0), (0.0, 20.0)],
    ),
    (
        Parameter::Turbidity,
        [(0.0, 5.0), (0.0, 25.0), (0.0, 50.0), (0.0, 100.0), (0.0, 1000.0)],
    ),
    (
        Parameter::Temperature,
        [(15.0, 30.0), (10.0, 35.0), (5.0, 40.0), (0.0, 45.0), (-10.0, 60.0)],
    ),
    (
        Parameter::Conductivity,
        [(50.0, 1500.0), (30.0, 2500.0), (10.0, 4000.0), (5.0, 6000.0), (0.0, 10000.0)],
    ),
    (
        Parameter::TotalDissolvedSolids,
        [(0.0, 500.0), (0.0, 1000.0), (0.0, 2000.0), (0.0, 3000.0), (0.0, 10000.0)],
    ),
    (
        Parameter::BiochemicalOxygenDemand,
        [(0.0, 3.0), (0.0, 6.0), (0.0, 12.0), (0.0, 25.0), (0.0, 100.0)],
    ),
    (
        Parameter::ChemicalOxygenDemand,
        [(0.0, 10.0), (0.0, 25.0), (0.0, 50.0), (0.0, 100.0), (0.0, 500.0)],
    ),
    (
        Parameter::Nitrate,
        [(0.0, 10.0), (0.0, 25.0), (0.0, 50.0), (0.0, 100.0), (0.0, 500.0)],
    ),
    (
        Parameter::Phosphate,
        [(0.0, 0.1), (0.0, 0.5), (0.0, 1.0), (0.0, 2.0), (0.0, 10.0)],
    ),
    (
        Parameter::FecalColiform,
        [(0.0, 500.0), (0.0, 2500.0), (0.0, 5000.0), (0.0, 50000.0), (0.0, 1_000_000.0)],
    ),
];
