//! Snapshot Validation and Range Checking

use crate::error::ValidationError;
use crate::{Parameter, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Parameters every ingested snapshot must carry
    pub required: Vec<Parameter>,
    /// Optional hard limits per parameter
    ///
    /// Empty by default: finite values outside every threshold band are
    /// classified at the most severe level rather than rejected.
    pub ranges: BTreeMap<Parameter, (f64, f64)>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required: vec![
                Parameter::DissolvedOxygen,
                Parameter::BiochemicalOxygenDemand,
                Parameter::Nitrate,
                Parameter::FecalColiform,
                Parameter::Ph,
                Parameter::Temperature,
                Parameter::Turbidity,
            ],
            ranges: BTreeMap::new(),
        }
    }
}

impl ValidationConfig {
    /// No parameter is mandatory
    pub fn lenient() -> Self {
        Self {
            required: Vec::new(),
            ..Default::default()
        }
    }
}

/// Snapshot validator applied before classification
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(field));
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a parameter value against its configured limit, if any
    pub fn validate_value(&self, parameter: Parameter, value: f64) -> Result<(), ValidationError> {
        match self.config.ranges.get(&parameter) {
            Some(range) => self.validate_range(parameter.key(), value, *range),
            None if value.is_finite() => Ok(()),
            None => Err(ValidationError::NotFinite(parameter.key())),
        }
    }

    /// Validate a whole snapshot
    pub fn validate(&self, snapshot: &Snapshot) -> Result<(), ValidationError> {
        if snapshot.is_empty() {
            return Err(ValidationError::Empty(snapshot.location_id().to_string()));
        }

        if let Some(missing) = self
            .config
            .required
            .iter()
            .find(|p| snapshot.get(**p).is_none())
        {
            return Err(ValidationError::MissingField(missing.key()));
        }

        for (parameter, value) in snapshot.values() {
            self.validate_value(parameter, value)?;
        }

        debug!(
            "Snapshot for {} passed validation ({} fields)",
            snapshot.location_id(),
            snapshot.len()
        );
        Ok(())
    }

    /// Build and validate a snapshot from raw keyed fields
    ///
    /// A `None` value is treated as a missing field; unknown keys are a
    /// format error.
    pub fn parse<'a>(
        &self,
        location_id: &str,
        timestamp: DateTime<Utc>,
        fields: impl IntoIterator<Item = (&'a str, Option<f64>)>,
    ) -> Result<Snapshot, ValidationError> {
        let mut values = Vec::new();
        for (key, value) in fields {
            let parameter: Parameter = key.parse().map_err(ValidationError::InvalidFormat)?;
            let value = value.ok_or(ValidationError::MissingField(parameter.key()))?;
            values.push((parameter, value));
        }

        let snapshot = Snapshot::new(location_id, timestamp, values);
        self.validate(&snapshot)?;
        Ok(snapshot)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
