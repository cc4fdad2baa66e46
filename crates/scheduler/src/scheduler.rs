//! Cycle Orchestrator Implementation

use alerting::{AlertError, AlertManager, LocationFailure};
use chrono::{DateTime, Utc};
use forecaster::{ForecastError, Forecaster, HistoryStore};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{watch, AcquireError, Semaphore};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use water_quality::{Location, LocationDirectory, StoreError};

/// Configuration for the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between alert evaluation cycles
    pub evaluation_interval_secs: u64,
    /// Seconds between forecast cycles (daily)
    pub forecast_interval_secs: u64,
    /// Seconds between retention cleanups (daily)
    pub cleanup_interval_secs: u64,
    /// Locations worked on at once
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 15 * 60,
            forecast_interval_secs: 24 * 60 * 60,
            cleanup_interval_secs: 24 * 60 * 60,
            max_concurrent: 4,
        }
    }
}

/// Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("Worker task failed: {0}")]
    Join(#[from] JoinError),

    #[error("Worker pool closed")]
    Closed(#[from] AcquireError),

    #[error("Worker panicked: {0}")]
    Panicked(String),
}

/// Kind of periodic work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Evaluation,
    Forecast,
    Cleanup,
}

impl Cycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Cycle::Evaluation => "evaluation",
            Cycle::Forecast => "forecast",
            Cycle::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one per-location cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: Cycle,
    pub processed: usize,
    pub succeeded: usize,
    /// Locations with nothing to work on yet
    pub skipped: usize,
    pub failures: Vec<LocationFailure>,
    pub elapsed: Duration,
}

impl CycleReport {
    fn new(cycle: Cycle) -> Self {
        Self {
            cycle,
            processed: 0,
            succeeded: 0,
            skipped: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Done,
    Skipped,
}

type LocationJob = fn(&Jobs, &Location) -> Result<Outcome, SchedulerError>;

/// Shared state of the cycle loops
struct Jobs {
    config: SchedulerConfig,
    alerts: Arc<AlertManager>,
    forecaster: Arc<Forecaster>,
    history: Arc<dyn HistoryStore>,
    locations: Arc<dyn LocationDirectory>,
    pool: Arc<Semaphore>,
    /// Timestamp of the newest reading already evaluated per location
    evaluated: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Jobs {
    async fn run_cycle(self: &Arc<Self>, cycle: Cycle) -> Result<CycleReport, SchedulerError> {
        match cycle {
            Cycle::Evaluation => self.for_each_location(cycle, evaluate_location).await,
            Cycle::Forecast => self.for_each_location(cycle, forecast_location).await,
            Cycle::Cleanup => {
                let started = Instant::now();
                let removed = self.cleanup().await?;
                let mut report = CycleReport::new(cycle);
                report.succeeded = removed;
                report.elapsed = started.elapsed();
                Ok(report)
            }
        }
    }

    async fn for_each_location(
        self: &Arc<Self>,
        cycle: Cycle,
        job: LocationJob,
    ) -> Result<CycleReport, SchedulerError> {
        let started = Instant::now();
        counter!("riverwatch_cycle_runs_total", "cycle" => cycle.as_str()).increment(1);

        let directory = Arc::clone(&self.locations);
        let locations = task::spawn_blocking(move || directory.active_locations()).await??;
        debug!("{} cycle over {} locations", cycle, locations.len());

        let mut tasks = JoinSet::new();
        for location in locations {
            let permit = Arc::clone(&self.pool).acquire_owned().await?;
            let jobs = Arc::clone(self);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&jobs, &location)))
                    .unwrap_or_else(|payload| Err(SchedulerError::Panicked(panic_message(&*payload))));
                (location.id, outcome)
            });
        }

        let mut report = CycleReport::new(cycle);
        while let Some(joined) = tasks.join_next().await {
            report.processed += 1;
            let (location_id, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!("{} worker aborted: {}", cycle, e);
                    record_outcome(cycle, "aborted");
                    continue;
                }
            };

            match outcome {
                Ok(Outcome::Done) => {
                    report.succeeded += 1;
                    record_outcome(cycle, "succeeded");
                }
                Ok(Outcome::Skipped) => {
                    report.skipped += 1;
                    record_outcome(cycle, "skipped");
                }
                Err(e) => {
                    warn!("{} cycle failed for {}: {}", cycle, location_id, e);
                    record_outcome(cycle, "failed");
                    report.failures.push(LocationFailure {
                        location_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.elapsed = started.elapsed();
        histogram!("riverwatch_cycle_duration_seconds", "cycle" => cycle.as_str())
            .record(report.elapsed.as_secs_f64());
        info!(
            "{} cycle: {} processed, {} succeeded, {} skipped, {} failed in {:?}",
            cycle,
            report.processed,
            report.succeeded,
            report.skipped,
            report.failures.len(),
            report.elapsed
        );
        Ok(report)
    }

    async fn cleanup(&self) -> Result<usize, SchedulerError> {
        counter!("riverwatch_cycle_runs_total", "cycle" => Cycle::Cleanup.as_str()).increment(1);
        let forecaster = Arc::clone(&self.forecaster);
        let days = forecaster.config().retention_days;
        let removed = task::spawn_blocking(move || forecaster.purge_older_than(days)).await??;
        counter!("riverwatch_forecasts_purged_total").increment(removed as u64);
        info!("Cleanup removed {} forecasts older than {} days", removed, days);
        Ok(removed)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn record_outcome(cycle: Cycle, outcome: &'static str) {
    counter!(
        "riverwatch_locations_processed_total",
        "cycle" => cycle.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Classify the newest reading and record the resulting alert changes
///
/// A reading is evaluated once; cycles without a newer reading skip the
/// location. A reading rejected by validation is not retried.
fn evaluate_location(jobs: &Jobs, location: &Location) -> Result<Outcome, SchedulerError> {
    let Some(latest) = jobs.history.load_history(&location.id, 1)?.into_iter().next() else {
        debug!("No readings yet for {}", location.id);
        return Ok(Outcome::Skipped);
    };

    let last_seen = jobs
        .evaluated
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&location.id)
        .copied();
    if last_seen.is_some_and(|seen| latest.timestamp() <= seen) {
        debug!("No new reading for {} since {}", location.id, latest.timestamp());
        return Ok(Outcome::Skipped);
    }

    let result = jobs.alerts.evaluate_and_record(&latest, &location.name);
    if matches!(result, Ok(_) | Err(AlertError::Validation(_))) {
        jobs.evaluated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(location.id.clone(), latest.timestamp());
    }

    let delta = result?;
    if delta.created.is_some() {
        counter!("riverwatch_alerts_created_total").increment(1);
    }
    if !delta.resolved.is_empty() {
        counter!("riverwatch_alerts_resolved_total").increment(delta.resolved.len() as u64);
    }
    Ok(Outcome::Done)
}

fn forecast_location(jobs: &Jobs, location: &Location) -> Result<Outcome, SchedulerError> {
    let horizon = jobs.forecaster.config().horizon_days;
    match jobs.forecaster.predict(&location.id, horizon) {
        Ok(forecast) => {
            counter!("riverwatch_forecast_alerts_total").increment(forecast.alerts.len() as u64);
            Ok(Outcome::Done)
        }
        Err(ForecastError::InsufficientHistory(_)) => {
            debug!("No history to forecast for {}", location.id);
            Ok(Outcome::Skipped)
        }
        Err(e) => Err(e.into()),
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    loops: Vec<JoinHandle<()>>,
}

/// Runs the evaluation, forecast and cleanup cycles on their intervals
pub struct Orchestrator {
    jobs: Arc<Jobs>,
    running: Mutex<Option<Running>>,
}

impl Orchestrator {
    /// Create a stopped orchestrator
    pub fn new(
        config: SchedulerConfig,
        alerts: Arc<AlertManager>,
        forecaster: Arc<Forecaster>,
        history: Arc<dyn HistoryStore>,
        locations: Arc<dyn LocationDirectory>,
    ) -> Self {
        let pool = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            jobs: Arc::new(Jobs {
                config,
                alerts,
                forecaster,
                history,
                locations,
                pool,
                evaluated: Mutex::new(HashMap::new()),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.jobs.config
    }

    /// Start the cycle loops on the current runtime
    ///
    /// Each loop runs its first cycle immediately. Returns false when the
    /// loops are already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            debug!("Orchestrator already running");
            return false;
        }

        let (shutdown, watcher) = watch::channel(false);
        let config = &self.jobs.config;
        let loops = [
            (Cycle::Evaluation, config.evaluation_interval_secs),
            (Cycle::Forecast, config.forecast_interval_secs),
            (Cycle::Cleanup, config.cleanup_interval_secs),
        ]
        .into_iter()
        .map(|(cycle, secs)| {
            spawn_loop(
                Arc::clone(&self.jobs),
                cycle,
                Duration::from_secs(secs.max(1)),
                watcher.clone(),
            )
        })
        .collect();

        info!(
            "Orchestrator started (evaluation every {}s, forecast every {}s, cleanup every {}s)",
            config.evaluation_interval_secs,
            config.forecast_interval_secs,
            config.cleanup_interval_secs
        );
        *running = Some(Running { shutdown, loops });
        true
    }

    /// Stop the loops, letting an in-flight cycle finish
    pub async fn stop(&self) {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(running) = taken else {
            return;
        };

        info!("Stopping orchestrator");
        let _ = running.shutdown.send(true);
        for handle in running.loops {
            if let Err(e) = handle.await {
                warn!("Cycle loop ended abnormally: {}", e);
            }
        }
        info!("Orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Evaluate the latest reading of every active location
    pub async fn run_evaluation_cycle(&self) -> Result<CycleReport, SchedulerError> {
        self.jobs.run_cycle(Cycle::Evaluation).await
    }

    /// Regenerate today's forecast for every active location
    pub async fn run_forecast_cycle(&self) -> Result<CycleReport, SchedulerError> {
        self.jobs.run_cycle(Cycle::Forecast).await
    }

    /// Purge forecasts past retention; returns how many were removed
    pub async fn run_cleanup(&self) -> Result<usize, SchedulerError> {
        self.jobs.cleanup().await
    }
}

fn spawn_loop(
    jobs: Arc<Jobs>,
    cycle: Cycle,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = jobs.run_cycle(cycle).await {
                        warn!("{} cycle aborted: {}", cycle, e);
                    }
                }
            }
        }
        debug!("{} loop exited", cycle);
    })
}
