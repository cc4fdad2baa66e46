//! Alert Persistence Boundary

use crate::Alert;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use water_quality::StoreError;

/// Storage for alert records
pub trait AlertStore: Send + Sync {
    /// Active and acknowledged alerts for a location
    fn open_alerts(&self, location_id: &str) -> Result<Vec<Alert>, StoreError>;

    fn alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError>;

    /// Insert or replace by id
    fn save_alert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Every alert in `active` status across all locations
    fn active_alerts(&self) -> Result<Vec<Alert>, StoreError>;

    fn alerts_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError>;
}
