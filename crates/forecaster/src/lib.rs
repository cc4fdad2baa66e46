//! Trend Forecaster
//!
//! Projects each monitored parameter several days ahead from its recent
//! history, adjusting for season, environmental covariates, and correlated
//! parameters, then scores the predicted quality.

mod config;
mod correlation;
mod environment;
mod forecaster;
mod model;
mod quality;
mod season;
mod statistics;
mod store;
mod trend;

pub use config::ForecastConfig;
pub use correlation::{correlated_departure, predictors, CORRELATIONS};
pub use environment::{environmental_impact, CovariateSpread, Covariates};
pub use forecaster::Forecaster;
pub use model::{
    Forecast, ForecastAlert, ForecastSeverity, ModelInfo, ParameterForecast, Prediction,
    QualityStatus, StatusClass,
};
pub use quality::{alert_severity, quality_index, recommended_action, INDEX_WEIGHTS};
pub use season::{Season, SeasonProfile, SeasonTable};
pub use statistics::WindowStats;
pub use store::{ForecastStore, HistoryStore};
pub use trend::{estimate_trend, TrendEstimate, TrendLabel, TREND_WINDOW};

use thiserror::Error;
use water_quality::StoreError;

/// Forecasting errors
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("No history available for location {0}")]
    InsufficientHistory(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
