//! RiverWatch Service
//!
//! Wires the repository, alert manager, forecaster and orchestrator from
//! [`Settings`], plus the startup reading import and shutdown forecast dump.

pub mod settings;
pub mod telemetry;

pub use settings::{LoggingSettings, Settings};
pub use telemetry::{init_logging, install_metrics};

use alerting::AlertManager;
use forecaster::{Forecast, ForecastError, Forecaster};
use risk_classifier::Classifier;
use scheduler::Orchestrator;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use storage::Repository;
use thiserror::Error;
use tracing::{info, warn};
use water_quality::{Clock, LocationDirectory, Snapshot, StoreError};

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Assembled service components
pub struct App {
    pub repository: Arc<Repository>,
    pub alerts: Arc<AlertManager>,
    pub forecaster: Arc<Forecaster>,
    pub orchestrator: Orchestrator,
}

impl App {
    /// Build every component over one shared in-memory repository
    pub fn build(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self, ServiceError> {
        let repository = Arc::new(Repository::with_config(settings.storage.clone()));
        for location in &settings.locations {
            repository.upsert_location(location.clone())?;
        }

        let classifier = Classifier::new(settings.thresholds.clone());
        let alerts = Arc::new(AlertManager::new(
            settings.alerts.clone(),
            classifier.clone(),
            repository.clone(),
            clock.clone(),
        ));
        let forecaster = Arc::new(Forecaster::new(
            settings.forecast.clone(),
            classifier,
            repository.clone(),
            repository.clone(),
            clock,
        ));
        let orchestrator = Orchestrator::new(
            settings.scheduler.clone(),
            alerts.clone(),
            forecaster.clone(),
            repository.clone(),
            repository.clone(),
        );

        info!(
            "Service assembled with {} configured locations",
            settings.locations.len()
        );
        Ok(Self {
            repository,
            alerts,
            forecaster,
            orchestrator,
        })
    }

    /// Import a JSON array of snapshots; returns how many were stored
    pub fn load_readings(&self, path: &Path) -> Result<usize, ServiceError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshots: Vec<Snapshot> = serde_json::from_reader(reader)?;

        let mut stored = 0;
        for snapshot in snapshots {
            if self.repository.location(snapshot.location_id())?.is_none() {
                warn!(
                    "Skipping reading for unknown location {}",
                    snapshot.location_id()
                );
                continue;
            }
            self.repository.insert_snapshot(snapshot)?;
            stored += 1;
        }
        info!("Loaded {} readings from {}", stored, path.display());
        Ok(stored)
    }

    /// Write the stored forecasts of every active location as JSON
    pub fn dump_forecasts(&self, path: &Path) -> Result<usize, ServiceError> {
        let horizon = self.forecaster.config().horizon_days;
        let mut forecasts: Vec<Forecast> = Vec::new();
        for location in self.repository.active_locations()? {
            forecasts.extend(self.forecaster.forecasts_for(&location.id, horizon)?);
        }

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &forecasts)?;
        info!("Wrote {} forecasts to {}", forecasts.len(), path.display());
        Ok(forecasts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;
    use water_quality::{Location, ManualClock, Parameter};

    fn temp_path(ext: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("riverwatch-{}.{}", uuid::Uuid::new_v4(), ext))
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.locations = vec![
            Location::new("kanpur-01", "Kanpur"),
            Location::new("patna-03", "Patna"),
        ];
        settings.forecast.noise_scale = 0.0;
        settings.forecast.seed = Some(1);
        settings
    }

    fn readings() -> Vec<Snapshot> {
        let end = Utc.with_ymd_and_hms(2026, 8, 10, 6, 0, 0).unwrap();
        let mut readings: Vec<Snapshot> = (0..12)
            .map(|i| {
                Snapshot::new(
                    "kanpur-01",
                    end - Duration::hours(6 * i),
                    [
                        (Parameter::DissolvedOxygen, 6.8),
                        (Parameter::BiochemicalOxygenDemand, 2.5),
                        (Parameter::Nitrate, 4.0),
                        (Parameter::FecalColiform, 400.0),
                        (Parameter::Ph, 7.2),
                        (Parameter::Temperature, 27.0),
                        (Parameter::Turbidity, 4.0),
                    ],
                )
            })
            .collect();
        readings.push(Snapshot::new("ganga-99", end, [(Parameter::Ph, 7.0)]));
        readings
    }

    #[tokio::test]
    async fn test_import_cycle_and_dump() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 8, 10, 7, 0, 0).unwrap(),
        ));
        let app = App::build(&settings(), clock).unwrap();
        assert_eq!(app.repository.active_locations().unwrap().len(), 2);

        let input = temp_path("json");
        fs::write(&input, serde_json::to_string(&readings()).unwrap()).unwrap();
        assert_eq!(app.load_readings(&input).unwrap(), 12);
        fs::remove_file(&input).ok();

        let evaluated = app.orchestrator.run_evaluation_cycle().await.unwrap();
        assert_eq!(evaluated.succeeded, 1);
        assert_eq!(evaluated.skipped, 1);
        assert_eq!(app.alerts.statistics().unwrap().total_active, 0);

        let forecasted = app.orchestrator.run_forecast_cycle().await.unwrap();
        assert_eq!(forecasted.succeeded, 1);

        let output = temp_path("json");
        assert_eq!(app.dump_forecasts(&output).unwrap(), 1);
        let dumped: Vec<Forecast> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        fs::remove_file(&output).ok();
        assert_eq!(dumped[0].location_id, "kanpur-01");
        assert_eq!(dumped[0].predictions.len(), 7);
    }

    #[test]
    fn test_missing_readings_file() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let app = App::build(&settings(), clock).unwrap();
        let result = app.load_readings(&temp_path("json"));
        assert!(matches!(result, Err(ServiceError::Io(_))));
    }
}
