//! Threshold Classification

use crate::{Band, Evaluation, ParameterReading, ParameterSpec, RiskLevel, ThresholdTable};
use std::sync::Arc;
use tracing::debug;
use water_quality::{Parameter, Snapshot};

/// Classify a value against one parameter's bands
///
/// Levels are scanned from 5 down. A level applies when its band holds the
/// value and the next-milder band does not; with nested bands this is the
/// mildest band containing the value. A value outside every band, or a
/// non-finite value, is reported at level 5.
pub fn classify_value(spec: &ParameterSpec, value: f64) -> (RiskLevel, Option<Band>) {
    if value.is_finite() {
        for level in RiskLevel::ALL.iter().rev().copied() {
            let band = spec.band(level);
            let milder_holds = level
                .milder()
                .map_or(false, |milder| spec.band(milder).contains(value));
            if band.contains(value) && !milder_holds {
                return (level, Some(band));
            }
        }
    }

    debug!(
        "{} value {} matched no authored band, failing high",
        spec.parameter, value
    );
    (RiskLevel::Emergency, None)
}

/// Stateless classifier over a shared threshold table
#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<ThresholdTable>,
}

impl Classifier {
    /// Create a classifier over a threshold table
    pub fn new(table: ThresholdTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Risk level of a value; `None` when the parameter has no thresholds
    pub fn classify(&self, parameter: Parameter, value: f64) -> Option<RiskLevel> {
        self.table
            .get(parameter)
            .map(|spec| classify_value(spec, value).0)
    }

    /// Classify every present parameter of a snapshot
    ///
    /// Parameters without thresholds are skipped. The overall level is the
    /// maximum per-parameter level, `Normal` for an empty snapshot.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Evaluation {
        let readings: Vec<ParameterReading> = snapshot
            .values()
            .filter_map(|(parameter, value)| {
                let spec = self.table.get(parameter)?;
                let (level, band_matched) = classify_value(spec, value);
                Some(ParameterReading {
                    parameter,
                    value,
                    level,
                    band_matched,
                })
            })
            .collect();

        let overall = readings
            .iter()
            .map(|r| r.level)
            .max()
            .unwrap_or(RiskLevel::Normal);

        Evaluation {
            overall,
            readings,
            timestamp: snapshot.timestamp(),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ThresholdTable::standard())
    }
}
