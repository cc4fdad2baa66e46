//! Alert Lifecycle
//!
//! Turns classifier evaluations into deduplicated alert records and drives
//! them through the active, acknowledged, resolved, and false-positive states.

mod alert;
mod manager;
mod message;
mod stats;
mod store;

pub use alert::{
    ActionEntry, Alert, AlertAction, AlertCategory, AlertSource, AlertStatus, Severity,
    ThresholdSummary,
};
pub use manager::{AlertConfig, AlertDelta, AlertFilter, AlertManager, BulkSummary, LocationFailure};
pub use message::AlertMessage;
pub use stats::{AlertStatistics, DailyTrend, LevelCount};
pub use store::AlertStore;

use thiserror::Error;
use uuid::Uuid;
use water_quality::{StoreError, ValidationError};

/// Alert lifecycle errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert {0} not found")]
    NotFound(Uuid),

    #[error("Alert {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: AlertStatus,
        to: AlertStatus,
    },

    #[error("Invalid snapshot: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
