//! History and Forecast Persistence Boundaries

use crate::Forecast;
use chrono::{DateTime, NaiveDate, Utc};
use std::ops::RangeInclusive;
use water_quality::{Snapshot, StoreError};

/// Read access to measured snapshots
pub trait HistoryStore: Send + Sync {
    /// Up to `max_count` snapshots for a location, newest first
    fn load_history(&self, location_id: &str, max_count: usize) -> Result<Vec<Snapshot>, StoreError>;
}

/// Storage for generated forecasts
pub trait ForecastStore: Send + Sync {
    fn save_forecast(&self, forecast: &Forecast) -> Result<(), StoreError>;

    /// Delete a location's forecasts dated within `dates`; returns the count removed
    fn delete_forecasts(
        &self,
        location_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<usize, StoreError>;

    /// A location's forecasts dated within `dates`, oldest first
    fn forecasts(
        &self,
        location_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<Vec<Forecast>, StoreError>;

    /// Delete forecasts generated before `cutoff`; returns the count removed
    fn delete_generated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
