//! Forecaster Configuration

use crate::season::SeasonTable;
use serde::{Deserialize, Serialize};

/// Forecast configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Days ahead to forecast
    pub horizon_days: u32,
    /// Snapshots loaded per location (4 readings/day, about 20 days)
    pub history_limit: usize,
    /// Snapshots considered for trend estimation
    pub trend_window: usize,
    /// Share of the correlated predictors' departure applied to a parameter
    pub correlation_strength: f64,
    /// Multiplier on random perturbation; 0 disables noise
    pub noise_scale: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    /// Stored forecasts older than this are purged
    pub retention_days: u32,
    pub seasons: SeasonTable,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            history_limit: 80,
            trend_window: 14,
            correlation_strength: 0.3,
            noise_scale: 1.0,
            seed: None,
            retention_days: 30,
            seasons: SeasonTable::default(),
        }
    }
}

impl ForecastConfig {
    /// Noise disabled, fixed seed
    pub fn deterministic() -> Self {
        Self {
            noise_scale: 0.0,
            seed: Some(0),
            ..Default::default()
        }
    }
}
