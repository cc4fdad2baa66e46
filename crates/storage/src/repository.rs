//! Repository Implementation

use alerting::{Alert, AlertStatus, AlertStore};
use chrono::{DateTime, NaiveDate, Utc};
use forecaster::{Forecast, ForecastStore, HistoryStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;
use water_quality::{Location, LocationDirectory, Snapshot, StoreError};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshots kept per location (30 days at 4 readings/day by default)
    pub max_snapshots_per_location: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_snapshots_per_location: 120,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::Backend(format!("Lock error: {}", e)))
}

/// Repository for data access (in-memory implementation)
pub struct Repository {
    /// Snapshots per location, oldest first
    snapshots: Mutex<HashMap<String, VecDeque<Snapshot>>>,
    /// Alerts by id; never deleted
    alerts: Mutex<HashMap<Uuid, Alert>>,
    forecasts: Mutex<Vec<Forecast>>,
    locations: Mutex<BTreeMap<String, Location>>,
    config: StorageConfig,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    pub fn with_config(config: StorageConfig) -> Self {
        info!(
            "Creating in-memory repository (keeping {} snapshots per location)",
            config.max_snapshots_per_location
        );
        Self {
            snapshots: Mutex::new(HashMap::new()),
            alerts: Mutex::new(HashMap::new()),
            forecasts: Mutex::new(Vec::new()),
            locations: Mutex::new(BTreeMap::new()),
            config,
        }
    }

    /// Register or replace a monitoring location
    pub fn upsert_location(&self, location: Location) -> Result<(), StoreError> {
        debug!("Registering location {} ({})", location.id, location.name);
        lock(&self.locations)?.insert(location.id.clone(), location);
        Ok(())
    }

    pub fn location(&self, id: &str) -> Result<Option<Location>, StoreError> {
        Ok(lock(&self.locations)?.get(id).cloned())
    }

    /// Record a measured snapshot
    ///
    /// Snapshots are kept in timestamp order; the oldest fall off past the
    /// retention limit.
    pub fn insert_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let mut snapshots = lock(&self.snapshots)?;
        let series = snapshots
            .entry(snapshot.location_id().to_string())
            .or_default();

        let at = series.partition_point(|s| s.timestamp() <= snapshot.timestamp());
        series.insert(at, snapshot);

        while series.len() > self.config.max_snapshots_per_location {
            series.pop_front();
        }
        Ok(())
    }

    /// Most recent snapshot for a location
    pub fn latest_snapshot(&self, location_id: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(lock(&self.snapshots)?
            .get(location_id)
            .and_then(|s| s.back().cloned()))
    }

    pub fn snapshot_count(&self, location_id: &str) -> usize {
        lock(&self.snapshots)
            .map(|s| s.get(location_id).map_or(0, VecDeque::len))
            .unwrap_or(0)
    }

    pub fn alert_count(&self) -> usize {
        lock(&self.alerts).map(|a| a.len()).unwrap_or(0)
    }

    pub fn forecast_count(&self) -> usize {
        lock(&self.forecasts).map(|f| f.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut snapshots) = self.snapshots.lock() {
            snapshots.clear();
        }
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
        if let Ok(mut forecasts) = self.forecasts.lock() {
            forecasts.clear();
        }
    }

    fn alerts_where(&self, keep: impl Fn(&Alert) -> bool) -> Result<Vec<Alert>, StoreError> {
        let mut alerts: Vec<Alert> = lock(&self.alerts)?
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.created_at());
        Ok(alerts)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for Repository {
    fn load_history(&self, location_id: &str, max_count: usize) -> Result<Vec<Snapshot>, StoreError> {
        Ok(lock(&self.snapshots)?
            .get(location_id)
            .map(|s| s.iter().rev().take(max_count).cloned().collect())
            .unwrap_or_default())
    }
}

impl AlertStore for Repository {
    fn open_alerts(&self, location_id: &str) -> Result<Vec<Alert>, StoreError> {
        self.alerts_where(|a| a.location_id() == location_id && a.status().is_open())
    }

    fn alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        Ok(lock(&self.alerts)?.get(&id).cloned())
    }

    fn save_alert(&self, alert: &Alert) -> Result<(), StoreError> {
        lock(&self.alerts)?.insert(alert.id(), alert.clone());
        Ok(())
    }

    fn active_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        self.alerts_where(|a| a.status() == AlertStatus::Active)
    }

    fn alerts_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Alert>, StoreError> {
        self.alerts_where(|a| a.created_at() >= since)
    }
}

impl ForecastStore for Repository {
    fn save_forecast(&self, forecast: &Forecast) -> Result<(), StoreError> {
        lock(&self.forecasts)?.push(forecast.clone());
        Ok(())
    }

    fn delete_forecasts(
        &self,
        location_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<usize, StoreError> {
        let mut forecasts = lock(&self.forecasts)?;
        let before = forecasts.len();
        forecasts.retain(|f| !(f.location_id == location_id && dates.contains(&f.forecast_date)));
        Ok(before - forecasts.len())
    }

    fn forecasts(
        &self,
        location_id: &str,
        dates: RangeInclusive<NaiveDate>,
    ) -> Result<Vec<Forecast>, StoreError> {
        let mut found: Vec<Forecast> = lock(&self.forecasts)?
            .iter()
            .filter(|f| f.location_id == location_id && dates.contains(&f.forecast_date))
            .cloned()
            .collect();
        found.sort_by_key(|f| f.forecast_date);
        Ok(found)
    }

    fn delete_generated_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut forecasts = lock(&self.forecasts)?;
        let before = forecasts.len();
        forecasts.retain(|f| f.generated_at >= cutoff);
        Ok(before - forecasts.len())
    }
}

impl LocationDirectory for Repository {
    fn active_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(lock(&self.locations)?
            .values()
            .filter(|l| l.active)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertConfig, AlertManager};
    use chrono::{Duration, TimeZone};
    use forecaster::{ForecastConfig, Forecaster};
    use risk_classifier::{Classifier, RiskLevel};
    use std::sync::Arc;
    use water_quality::{Clock, ManualClock, Parameter};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap()
    }

    fn reading(location: &str, at: DateTime<Utc>, ph: f64) -> Snapshot {
        Snapshot::new(
            location,
            at,
            [
                (Parameter::DissolvedOxygen, 7.8),
                (Parameter::BiochemicalOxygenDemand, 2.2),
                (Parameter::Nitrate, 1.2),
                (Parameter::FecalColiform, 120.0),
                (Parameter::Ph, ph),
                (Parameter::Temperature, 19.0),
                (Parameter::Turbidity, 4.0),
            ],
        )
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let repo = Repository::new();
        for i in 0..5 {
            repo.insert_snapshot(reading("kanpur-01", start() + Duration::hours(i), 7.0))
                .unwrap();
        }
        // Late arrival lands in timestamp order
        repo.insert_snapshot(reading("kanpur-01", start() - Duration::hours(1), 6.9))
            .unwrap();

        let history = repo.load_history("kanpur-01", 3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].timestamp(), start() + Duration::hours(4));
        assert!(history[0].timestamp() > history[1].timestamp());

        let all = repo.load_history("kanpur-01", 100).unwrap();
        assert_eq!(all.last().unwrap().get(Parameter::Ph), Some(6.9));
        assert!(repo.load_history("elsewhere", 10).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_retention_limit() {
        let repo = Repository::with_config(StorageConfig {
            max_snapshots_per_location: 5,
        });
        for i in 0..10 {
            repo.insert_snapshot(reading("kanpur-01", start() + Duration::hours(i), 7.0))
                .unwrap();
        }

        assert_eq!(repo.snapshot_count("kanpur-01"), 5);
        let oldest = repo.load_history("kanpur-01", 10).unwrap().pop().unwrap();
        assert_eq!(oldest.timestamp(), start() + Duration::hours(5));
    }

    #[test]
    fn test_active_locations() {
        let repo = Repository::new();
        repo.upsert_location(Location::new("kanpur-01", "Kanpur Barrage"))
            .unwrap();
        repo.upsert_location(Location {
            active: false,
            ..Location::new("unnao-04", "Unnao")
        })
        .unwrap();

        let active = repo.active_locations().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Kanpur Barrage");
        assert!(repo.location("unnao-04").unwrap().is_some());
    }

    #[test]
    fn test_alert_lifecycle_end_to_end() {
        let repo = Arc::new(Repository::new());
        let clock = Arc::new(ManualClock::new(start()));
        let manager = AlertManager::new(
            AlertConfig::default(),
            Classifier::default(),
            repo.clone(),
            clock.clone(),
        );

        let first = manager
            .evaluate_and_record(&reading("patna-03", start(), 9.2), "Patna")
            .unwrap();
        let alert = first.created.unwrap();
        assert_eq!(alert.level(), RiskLevel::Warning);

        clock.advance(Duration::hours(6));
        let second = manager
            .evaluate_and_record(&reading("patna-03", clock.now(), 9.3), "Patna")
            .unwrap();
        assert_eq!(second.updated.unwrap().id(), alert.id());
        assert_eq!(repo.alert_count(), 1);
        assert_eq!(repo.active_alerts().unwrap().len(), 1);

        clock.advance(Duration::hours(6));
        let third = manager
            .evaluate_and_record(&reading("patna-03", clock.now(), 7.4), "Patna")
            .unwrap();
        assert_eq!(third.resolved.len(), 1);
        assert!(repo.open_alerts("patna-03").unwrap().is_empty());

        let stored = repo.alert(alert.id()).unwrap().unwrap();
        assert_eq!(stored.status(), AlertStatus::Resolved);
        assert_eq!(stored.update_count(), 1);
        assert_eq!(stored.actions().len(), 1);
        assert_eq!(manager.statistics().unwrap().total_active, 0);
    }

    #[test]
    fn test_forecast_end_to_end() {
        let repo = Arc::new(Repository::new());
        let clock = Arc::new(ManualClock::new(start()));
        for i in 0..20 {
            repo.insert_snapshot(reading("varanasi-02", start() - Duration::hours(6 * i), 7.5))
                .unwrap();
        }

        let forecaster = Forecaster::new(
            ForecastConfig::deterministic(),
            Classifier::default(),
            repo.clone(),
            repo.clone(),
            clock.clone(),
        );

        forecaster.predict("varanasi-02", 7).unwrap();
        let latest = forecaster.predict("varanasi-02", 7).unwrap();
        assert_eq!(repo.forecast_count(), 1);

        let stored = forecaster.forecasts_for("varanasi-02", 7).unwrap();
        assert_eq!(stored[0].id, latest.id);
        let oxygen = stored[0].predictions[0].parameters[&Parameter::DissolvedOxygen].predicted;
        // Winter factor on a flat history
        assert!((oxygen - 7.8 * 1.15).abs() < 1e-6);

        clock.advance(Duration::days(40));
        assert_eq!(forecaster.purge_older_than(30).unwrap(), 1);
        assert_eq!(repo.forecast_count(), 0);
    }
}
