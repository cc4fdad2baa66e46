//! Service Configuration
//!
//! Defaults, overlaid by an optional TOML file, overlaid by `RIVERWATCH__*`
//! environment variables (`RIVERWATCH__SCHEDULER__MAX_CONCURRENT=8`).

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use forecaster::ForecastConfig;
use risk_classifier::ThresholdTable;
use scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storage::StorageConfig;
use water_quality::Location;

pub const ENV_PREFIX: &str = "RIVERWATCH";

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub locations: Vec<Location>,
    /// JSON array of snapshots loaded into the repository at startup
    pub readings_file: Option<PathBuf>,
    /// Stored forecasts are written here as JSON on shutdown
    pub forecast_dump: Option<PathBuf>,
    pub thresholds: ThresholdTable,
    pub logging: LoggingSettings,
    pub storage: StorageConfig,
    pub alerts: AlertConfig,
    pub forecast: ForecastConfig,
    pub scheduler: SchedulerConfig,
}

impl Settings {
    /// Load settings, reading `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
