//! Threshold Classifier
//!
//! Maps parameter values onto the five-level risk scale using authored,
//! nested threshold bands. Classification is pure: no state, no I/O.

mod classifier;
mod evaluation;
mod level;
mod thresholds;

pub use classifier::{classify_value, Classifier};
pub use evaluation::{Evaluation, ParameterReading};
pub use level::RiskLevel;
pub use thresholds::{Band, ParameterSpec, ThresholdTable};

use thiserror::Error;
use water_quality::{Direction, Parameter};

/// Errors raised when building a threshold table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{parameter} level {level} band is inverted: min {min} > max {max}")]
    InvertedBand {
        parameter: Parameter,
        level: u8,
        min: f64,
        max: f64,
    },
    #[error("{parameter} level {level} band does not nest inside level {outer}")]
    NotNested {
        parameter: Parameter,
        level: u8,
        outer: u8,
    },
    #[error("{parameter} bands do not widen consistently for {direction:?}")]
    DirectionMismatch {
        parameter: Parameter,
        direction: Direction,
    },
    #[error("Duplicate threshold spec for {0}")]
    Duplicate(Parameter),
}
