//! Validation and Store Error Types

use thiserror::Error;

/// Errors raised while validating an ingested snapshot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value outside a configured hard limit
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite reading
    #[error("{0} value is not a finite number")]
    NotFinite(&'static str),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Snapshot without a single parameter value
    #[error("Snapshot for location {0} carries no parameter values")]
    Empty(String),
}

/// Errors surfaced by store implementations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}
