//! Logging and Metrics Setup

use crate::settings::LoggingSettings;
use crate::ServiceError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ServiceError::Telemetry(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ServiceError::Telemetry(format!("Failed to set tracing subscriber: {}", e)))
}

/// Install the Prometheus recorder behind the `metrics` macros
pub fn install_metrics() -> Result<PrometheusHandle, ServiceError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServiceError::Telemetry(format!("Failed to install metrics recorder: {}", e)))
}
