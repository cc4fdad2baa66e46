//! RiverWatch - Main Entry Point

use service::{init_logging, install_metrics, App, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use water_quality::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings.logging)?;

    info!("=== RiverWatch v{} ===", env!("CARGO_PKG_VERSION"));
    let metrics = install_metrics()?;

    let app = App::build(&settings, Arc::new(SystemClock))?;
    if let Some(path) = &settings.readings_file {
        app.load_readings(path)?;
    }

    app.orchestrator.start();
    info!("Monitoring started; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    app.orchestrator.stop().await;
    if let Some(path) = &settings.forecast_dump {
        app.dump_forecasts(path)?;
    }

    info!("Metrics at shutdown:\n{}", metrics.render());
    Ok(())
}
