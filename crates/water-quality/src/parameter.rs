//! Monitored Water-Quality Parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a parameter's range is harmful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Pollutant-style parameters (BOD, nitrate, turbidity, ...)
    HigherIsWorse,
    /// Dissolved oxygen
    LowerIsWorse,
    /// pH, temperature, conductivity
    CenteredIsBest,
}

/// Water-quality parameter measured at a monitoring location
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    DissolvedOxygen,
    BiochemicalOxygenDemand,
    ChemicalOxygenDemand,
    Nitrate,
    Phosphate,
    FecalColiform,
    Ph,
    Turbidity,
    Temperature,
    Conductivity,
    TotalDissolvedSolids,
}

impl Parameter {
    /// Every known parameter, in wire order
    pub const ALL: [Parameter; 11] = [
        Parameter::DissolvedOxygen,
        Parameter::BiochemicalOxygenDemand,
        Parameter::ChemicalOxygenDemand,
        Parameter::Nitrate,
        Parameter::Phosphate,
        Parameter::FecalColiform,
        Parameter::Ph,
        Parameter::Turbidity,
        Parameter::Temperature,
        Parameter::Conductivity,
        Parameter::TotalDissolvedSolids,
    ];

    /// Wire key (camelCase)
    pub fn key(&self) -> &'static str {
        match self {
            Parameter::DissolvedOxygen => "dissolvedOxygen",
            Parameter::BiochemicalOxygenDemand => "biochemicalOxygenDemand",
            Parameter::ChemicalOxygenDemand => "chemicalOxygenDemand",
            Parameter::Nitrate => "nitrate",
            Parameter::Phosphate => "phosphate",
            Parameter::FecalColiform => "fecalColiform",
            Parameter::Ph => "ph",
            Parameter::Turbidity => "turbidity",
            Parameter::Temperature => "temperature",
            Parameter::Conductivity => "conductivity",
            Parameter::TotalDissolvedSolids => "totalDissolvedSolids",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Parameter::DissolvedOxygen => "Dissolved Oxygen",
            Parameter::BiochemicalOxygenDemand => "Biochemical Oxygen Demand",
            Parameter::ChemicalOxygenDemand => "Chemical Oxygen Demand",
            Parameter::Nitrate => "Nitrate",
            Parameter::Phosphate => "Phosphate",
            Parameter::FecalColiform => "Fecal Coliform",
            Parameter::Ph => "pH",
            Parameter::Turbidity => "Turbidity",
            Parameter::Temperature => "Temperature",
            Parameter::Conductivity => "Conductivity",
            Parameter::TotalDissolvedSolids => "Total Dissolved Solids",
        }
    }

    /// Measurement unit
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::DissolvedOxygen
            | Parameter::BiochemicalOxygenDemand
            | Parameter::ChemicalOxygenDemand
            | Parameter::Nitrate
            | Parameter::Phosphate
            | Parameter::TotalDissolvedSolids => "mg/L",
            Parameter::FecalColiform => "MPN/100ml",
            Parameter::Ph => "",
            Parameter::Turbidity => "NTU",
            Parameter::Temperature => "°C",
            Parameter::Conductivity => "µS/cm",
        }
    }

    /// Static parameter → direction table
    pub fn direction(&self) -> Direction {
        match self {
            Parameter::DissolvedOxygen => Direction::LowerIsWorse,
            Parameter::Ph | Parameter::Temperature | Parameter::Conductivity => {
                Direction::CenteredIsBest
            }
            Parameter::BiochemicalOxygenDemand
            | Parameter::ChemicalOxygenDemand
            | Parameter::Nitrate
            | Parameter::Phosphate
            | Parameter::FecalColiform
            | Parameter::Turbidity
            | Parameter::TotalDissolvedSolids => Direction::HigherIsWorse,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.key() == s)
            .ok_or_else(|| format!("unknown parameter '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for param in Parameter::ALL {
            assert_eq!(param.key().parse::<Parameter>().unwrap(), param);
        }
        assert!("salinity".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_key() {
        let json = serde_json::to_string(&Parameter::BiochemicalOxygenDemand).unwrap();
        assert_eq!(json, "\"biochemicalOxygenDemand\"");
        let json = serde_json::to_string(&Parameter::Ph).unwrap();
        assert_eq!(json, "\"ph\"");
    }

    #[test]
    fn test_directions() {
        assert_eq!(Parameter::DissolvedOxygen.direction(), Direction::LowerIsWorse);
        assert_eq!(Parameter::Ph.direction(), Direction::CenteredIsBest);
        assert_eq!(Parameter::Nitrate.direction(), Direction::HigherIsWorse);
    }
}
