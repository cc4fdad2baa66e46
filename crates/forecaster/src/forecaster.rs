//! Multi-Factor Forecast Generation

use crate::correlation::correlated_departure;
use crate::environment::{environmental_impact, Covariates};
use crate::model::{Forecast, ModelInfo, ParameterForecast, Prediction, QualityStatus, StatusClass};
use crate::quality::{alert_severity, forecast_alert, quality_index, INDEX_WEIGHTS};
use crate::season::{Season, SeasonProfile};
use crate::trend::{TrendEstimate, TrendLabel};
use crate::{ForecastConfig, ForecastError, ForecastStore, HistoryStore};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use risk_classifier::{Classifier, RiskLevel};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use water_quality::{Clock, Parameter, Snapshot};

const NOISE_DAY_ONE: f64 = 0.12;
const NOISE_FLOOR: f64 = 0.05;
const NOISE_FLOOR_DAY: u32 = 7;

/// Per-parameter inputs shared by every forecast day
#[derive(Debug)]
struct Driver {
    parameter: Parameter,
    latest: f64,
    trend: TrendEstimate,
    combined: f64,
    /// Per-day change relative to the latest value
    strength: f64,
    /// Optimum used to label centered parameters
    center: f64,
}

/// Inputs fixed for one forecast run
struct RunContext<'a> {
    location_id: &'a str,
    generated_at: DateTime<Utc>,
    profile: &'a SeasonProfile,
    observed: Covariates,
    drivers: Vec<Driver>,
}

/// Trend forecaster over a location's recent history
pub struct Forecaster {
    config: ForecastConfig,
    classifier: Classifier,
    history: Arc<dyn HistoryStore>,
    store: Arc<dyn ForecastStore>,
    clock: Arc<dyn Clock>,
}

impl Forecaster {
    pub fn new(
        config: ForecastConfig,
        classifier: Classifier,
        history: Arc<dyn HistoryStore>,
        store: Arc<dyn ForecastStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Creating forecaster (horizon {}d, history {}, noise scale {})",
            config.horizon_days, config.history_limit, config.noise_scale
        );
        Self {
            config,
            classifier,
            history,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast a location and replace today's stored forecast
    pub fn predict(&self, location_id: &str, horizon_days: u32) -> Result<Forecast, ForecastError> {
        let forecast = self.generate(location_id, horizon_days)?;
        let today = forecast.forecast_date;
        let replaced = self.store.delete_forecasts(location_id, today..=today)?;
        self.store.save_forecast(&forecast)?;
        info!(
            "Saved {}-day forecast for {} ({} alerts, replaced {})",
            forecast.predictions.len(),
            location_id,
            forecast.alerts.len(),
            replaced
        );
        Ok(forecast)
    }

    /// Forecast a location without persisting
    pub fn generate(&self, location_id: &str, horizon_days: u32) -> Result<Forecast, ForecastError> {
        let history = self
            .history
            .load_history(location_id, self.config.history_limit)?;
        let latest = history
            .first()
            .ok_or_else(|| ForecastError::InsufficientHistory(location_id.to_string()))?;

        let generated_at = self.clock.now();
        let today = generated_at.date_naive();
        let season = Season::from_date(today);
        debug!(
            "Forecasting {} from {} snapshots in {} season",
            location_id,
            history.len(),
            season
        );

        let drivers = INDEX_WEIGHTS
            .iter()
            .filter_map(|&(parameter, _)| self.driver(&history, latest, parameter))
            .collect();
        let context = RunContext {
            location_id,
            generated_at,
            profile: self.config.seasons.profile(season),
            observed: Covariates::from_snapshot(latest),
            drivers,
        };

        let mut rng = self.rng(location_id);
        let predictions: Vec<Prediction> = (1..=horizon_days)
            .map(|day| self.predict_day(&context, day, &mut rng))
            .collect();
        let alerts = predictions
            .iter()
            .flat_map(|p| p.alerts.iter().cloned())
            .collect();

        Ok(Forecast {
            id: Uuid::new_v4(),
            location_id: location_id.to_string(),
            forecast_date: today,
            generated_at,
            predictions,
            model: ModelInfo::default(),
            alerts,
        })
    }

    fn driver(&self, history: &[Snapshot], latest: &Snapshot, parameter: Parameter) -> Option<Driver> {
        let latest_value = latest.get(parameter)?;
        let trend = TrendEstimate::from_history(history, parameter, self.config.trend_window);
        let combined = trend.combined();
        let center = self
            .classifier
            .table()
            .get(parameter)
            .map_or(latest_value, |spec| spec.band(RiskLevel::Normal).center());

        Some(Driver {
            parameter,
            latest: latest_value,
            trend,
            combined,
            strength: combined.abs() / latest_value.abs().max(f64::EPSILON),
            center,
        })
    }

    fn predict_day(&self, ctx: &RunContext<'_>, day: u32, rng: &mut StdRng) -> Prediction {
        let conditions =
            ctx.observed
                .project(&ctx.profile.variability, day, self.config.noise_scale, rng);
        let delta = conditions.delta(&ctx.observed);
        let offset = f64::from(day);

        // Trend, season, and environment
        let staged: BTreeMap<Parameter, (f64, f64)> = ctx
            .drivers
            .iter()
            .map(|d| {
                let impact = environmental_impact(d.parameter, &delta);
                let value = (d.latest + d.combined * offset)
                    * ctx.profile.factor(d.parameter)
                    * (1.0 + impact);
                (d.parameter, (value, impact))
            })
            .collect();

        // Departure of each predictor from its seasonal baseline
        let departure = |p: Parameter| -> Option<f64> {
            if p == Parameter::Temperature {
                return relative(conditions.temperature, ctx.observed.temperature);
            }
            let driver = ctx.drivers.iter().find(|d| d.parameter == p)?;
            let (value, _) = staged.get(&p)?;
            relative(*value, driver.latest * ctx.profile.factor(p))
        };

        let noise = noise_fraction(day) * self.config.noise_scale;
        let mut values = Vec::with_capacity(ctx.drivers.len());
        for driver in &ctx.drivers {
            let (staged_value, impact) = staged[&driver.parameter];
            let shift =
                self.config.correlation_strength * correlated_departure(driver.parameter, &departure);
            let jitter = 1.0 + noise * rng.gen_range(-1.0f64..=1.0);
            let (lo, hi) = physical_bounds(driver.parameter);
            let value = (staged_value * (1.0 + shift) * jitter).clamp(lo, hi);
            values.push((driver, value, impact));
        }

        let predicted = Snapshot::new(
            ctx.location_id,
            ctx.generated_at + Duration::days(i64::from(day)),
            values.iter().map(|(d, v, _)| (d.parameter, *v)),
        );
        let evaluation = self.classifier.evaluate(&predicted);

        let mut parameters = BTreeMap::new();
        let mut alerts = Vec::new();
        for (driver, value, impact) in values {
            let level = evaluation
                .reading(driver.parameter)
                .map_or(RiskLevel::Normal, |r| r.level);
            let status = StatusClass::from_level(level);

            if let Some(severity) = alert_severity(status, driver.strength, day) {
                alerts.push(forecast_alert(driver.parameter, status, severity, value, day));
            }

            parameters.insert(
                driver.parameter,
                ParameterForecast {
                    predicted: value,
                    confidence: self.confidence(&driver.trend, ctx.profile, day),
                    trend: TrendLabel::classify(
                        &driver.trend,
                        driver.parameter.direction(),
                        driver.latest,
                        driver.center,
                    ),
                    impact,
                    level,
                    status,
                },
            );
        }

        let classes = parameters.iter().map(|(p, f)| (*p, f.status)).collect();
        let index = quality_index(&classes);

        Prediction {
            date: ctx.generated_at.date_naive() + Duration::days(i64::from(day)),
            day_offset: day,
            parameters,
            conditions,
            quality_index: index,
            status: QualityStatus::from_index(index),
            alerts,
        }
    }

    /// Blend of time decay, trend confidence, and season confidence (40-95)
    fn confidence(&self, trend: &TrendEstimate, profile: &SeasonProfile, day: u32) -> f64 {
        let decay = (95.0 - 8.0 * f64::from(day)).max(50.0);
        (0.5 * decay + 0.3 * trend.confidence * 100.0 + 0.2 * profile.confidence * 100.0)
            .clamp(40.0, 95.0)
    }

    fn rng(&self, location_id: &str) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ location_hash(location_id)),
            None => StdRng::from_entropy(),
        }
    }

    /// Stored forecasts dated from today through `days` ahead
    pub fn forecasts_for(&self, location_id: &str, days: u32) -> Result<Vec<Forecast>, ForecastError> {
        let today: NaiveDate = self.clock.now().date_naive();
        let until = today + Duration::days(i64::from(days));
        Ok(self.store.forecasts(location_id, today..=until)?)
    }

    /// Delete forecasts generated more than `days` ago
    pub fn purge_older_than(&self, days: u32) -> Result<usize, ForecastError> {
        let cutoff = self.clock.now() - Duration::days(i64::from(days));
        let removed = self.store.delete_generated_before(cutoff)?;
        if removed > 0 {
            info!("Purged {} forecasts generated before {}", removed, cutoff);
        }
        Ok(removed)
    }
}

fn relative(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        None
    } else {
        Some((value - baseline) / baseline.abs())
    }
}

/// Noise share shrinking linearly from 12% on day one to 5% from day seven
fn noise_fraction(day: u32) -> f64 {
    let step = f64::from(day.clamp(1, NOISE_FLOOR_DAY) - 1) / f64::from(NOISE_FLOOR_DAY - 1);
    NOISE_DAY_ONE - (NOISE_DAY_ONE - NOISE_FLOOR) * step
}

/// Plausible range of a forecast value
fn physical_bounds(parameter: Parameter) -> (f64, f64) {
    match parameter {
        Parameter::Ph => (6.0, 9.0),
        Parameter::DissolvedOxygen => (0.0, 15.0),
        Parameter::BiochemicalOxygenDemand => (0.0, 100.0),
        Parameter::Nitrate => (0.0, 500.0),
        Parameter::FecalColiform => (0.0, 1_000_000.0),
        Parameter::Turbidity => (0.0, 1_000.0),
        _ => (0.0, f64::MAX),
    }
}

/// FNV-1a, stable across runs for seeding
fn location_hash(location_id: &str) -> u64 {
    location_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastSeverity;
    use crate::store::memory::{MemoryForecasts, MemoryHistory};
    use chrono::TimeZone;
    use water_quality::ManualClock;

    struct Fixture {
        forecaster: Forecaster,
        history: Arc<MemoryHistory>,
        store: Arc<MemoryForecasts>,
        clock: Arc<ManualClock>,
    }

    fn fixture(config: ForecastConfig, now: DateTime<Utc>) -> Fixture {
        let history = Arc::new(MemoryHistory::default());
        let store = Arc::new(MemoryForecasts::default());
        let clock = Arc::new(ManualClock::new(now));
        let forecaster = Forecaster::new(
            config,
            Classifier::default(),
            history.clone(),
            store.clone(),
            clock.clone(),
        );
        Fixture {
            forecaster,
            history,
            store,
            clock,
        }
    }

    fn winter() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap()
    }

    fn summer() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 6, 0, 0).unwrap()
    }

    /// Fourteen readings six hours apart ending at `end`
    fn seed_history(history: &MemoryHistory, end: DateTime<Utc>, bod: impl Fn(usize) -> f64) {
        for i in 0..14 {
            let at = end - Duration::hours(6 * (13 - i as i64));
            history.push(Snapshot::new(
                "varanasi-02",
                at,
                [
                    (Parameter::DissolvedOxygen, 8.0),
                    (Parameter::BiochemicalOxygenDemand, bod(i)),
                    (Parameter::Ph, 7.5),
                    (Parameter::Nitrate, 1.0),
                    (Parameter::FecalColiform, 50.0),
                    (Parameter::Turbidity, 5.0),
                ],
            ));
        }
    }

    #[test]
    fn test_flat_winter_history() {
        let f = fixture(ForecastConfig::deterministic(), winter());
        seed_history(&f.history, winter(), |_| 2.0);

        let forecast = f.forecaster.predict("varanasi-02", 7).unwrap();
        assert_eq!(forecast.predictions.len(), 7);

        let day1 = forecast.day(1).unwrap();
        let oxygen = &day1.parameters[&Parameter::DissolvedOxygen];
        assert!((oxygen.predicted - 9.2).abs() < 1e-6);
        assert_eq!(oxygen.trend, TrendLabel::Stable);
        assert!((oxygen.confidence - 60.5).abs() < 1e-9);

        let expected = [
            (Parameter::BiochemicalOxygenDemand, 1.6),
            (Parameter::Ph, 7.65),
            (Parameter::Nitrate, 0.9),
            (Parameter::FecalColiform, 35.0),
            (Parameter::Turbidity, 3.0),
        ];
        for prediction in &forecast.predictions {
            for (parameter, value) in expected {
                let predicted = prediction.parameters[&parameter].predicted;
                assert!(
                    (predicted - value).abs() < 1e-6,
                    "{} day {}: {}",
                    parameter,
                    prediction.day_offset,
                    predicted
                );
            }
        }

        assert_eq!(day1.quality_index, 85.0);
        assert_eq!(day1.status, QualityStatus::Good);
        assert!(forecast.alerts.is_empty());
        assert_eq!(day1.date, NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());
    }

    #[test]
    fn test_rising_bod_raises_alerts() {
        let f = fixture(ForecastConfig::deterministic(), summer());
        seed_history(&f.history, summer(), |i| 2.0 + i as f64);

        let forecast = f.forecaster.predict("varanasi-02", 7).unwrap();
        let bod = |day: u32| {
            forecast.day(day).unwrap().parameters[&Parameter::BiochemicalOxygenDemand].clone()
        };

        // (15 + 0.7) * 1.1 before correlation
        assert!((bod(1).predicted - 17.27).abs() < 1e-6);
        assert!(bod(7).predicted > bod(1).predicted);
        assert_eq!(bod(1).trend, TrendLabel::Declining);
        assert_eq!(bod(1).level, RiskLevel::Critical);
        assert_eq!(bod(1).status, StatusClass::Poor);

        let severities: Vec<(u32, ForecastSeverity)> = forecast
            .alerts
            .iter()
            .filter(|a| a.parameter == Parameter::BiochemicalOxygenDemand)
            .map(|a| (a.day, a.severity))
            .collect();
        assert_eq!(severities.len(), 7);
        assert_eq!(severities[0], (1, ForecastSeverity::High));
        assert_eq!(severities[2], (3, ForecastSeverity::Medium));
        assert_eq!(severities[6], (7, ForecastSeverity::Low));

        // Rising BOD drags oxygen below its seasonal baseline
        let oxygen = forecast.day(1).unwrap().parameters[&Parameter::DissolvedOxygen].predicted;
        assert!(oxygen < 8.0 * 0.85);
    }

    #[test]
    fn test_no_history() {
        let f = fixture(ForecastConfig::deterministic(), winter());
        assert!(matches!(
            f.forecaster.predict("nowhere", 7),
            Err(ForecastError::InsufficientHistory(id)) if id == "nowhere"
        ));
    }

    #[test]
    fn test_regeneration_replaces_todays_forecast() {
        let f = fixture(ForecastConfig::deterministic(), winter());
        seed_history(&f.history, winter(), |_| 2.0);

        f.forecaster.predict("varanasi-02", 7).unwrap();
        f.clock.advance(Duration::hours(3));
        let second = f.forecaster.predict("varanasi-02", 3).unwrap();

        let stored = f.forecaster.forecasts_for("varanasi-02", 3).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, second.id);
        assert_eq!(stored[0].predictions.len(), 3);
    }

    #[test]
    fn test_seeded_noise_is_reproducible_and_bounded() {
        let config = ForecastConfig {
            seed: Some(42),
            ..Default::default()
        };
        let f = fixture(config, summer());
        seed_history(&f.history, summer(), |i| 2.0 + 0.1 * i as f64);

        let a = f.forecaster.generate("varanasi-02", 7).unwrap();
        let b = f.forecaster.generate("varanasi-02", 7).unwrap();
        assert_eq!(a.predictions, b.predictions);

        for prediction in &a.predictions {
            let ph = prediction.parameters[&Parameter::Ph].predicted;
            assert!((6.0..=9.0).contains(&ph));
            for forecast in prediction.parameters.values() {
                assert!(forecast.predicted >= 0.0);
                assert!((40.0..=95.0).contains(&forecast.confidence));
                assert!(forecast.impact.abs() <= 0.5);
            }
        }
    }

    #[test]
    fn test_purge_older_than() {
        let f = fixture(ForecastConfig::deterministic(), winter());
        seed_history(&f.history, winter(), |_| 2.0);

        f.forecaster.predict("varanasi-02", 1).unwrap();
        f.clock.advance(Duration::days(31));
        f.forecaster.predict("varanasi-02", 1).unwrap();

        assert_eq!(f.forecaster.purge_older_than(30).unwrap(), 1);
        assert_eq!(f.store.forecasts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_noise_fraction_schedule() {
        assert!((noise_fraction(1) - 0.12).abs() < 1e-12);
        assert!((noise_fraction(7) - 0.05).abs() < 1e-12);
        assert!((noise_fraction(30) - 0.05).abs() < 1e-12);
        assert!(noise_fraction(4) < noise_fraction(2));
    }
}
