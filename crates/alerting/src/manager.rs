//! Alert Lifecycle Manager Implementation

use crate::stats::{daily_trends, AlertStatistics, DailyTrend};
use crate::{Alert, AlertCategory, AlertError, AlertStatus, AlertStore};
use chrono::{DateTime, Duration, Utc};
use risk_classifier::{Classifier, Evaluation, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;
use water_quality::{Clock, Snapshot, ValidationConfig, Validator};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Window in which a same-level alert is updated instead of duplicated (hours)
    pub dedup_window_hours: i64,
    /// Actor recorded on automated transitions
    pub system_actor: String,
    /// Note recorded when quality returns to normal
    pub normalized_note: String,
    /// Limit applied to alert queries without an explicit one
    pub default_limit: usize,
    pub validation: ValidationConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            dedup_window_hours: 24,
            system_actor: "system".to_string(),
            normalized_note: "automated — quality normalized".to_string(),
            default_limit: 100,
            validation: ValidationConfig::default(),
        }
    }
}

/// Outcome of recording one evaluation
#[derive(Debug, Clone)]
pub struct AlertDelta {
    pub evaluation: Evaluation,
    pub created: Option<Alert>,
    pub updated: Option<Alert>,
    pub resolved: Vec<Alert>,
}

/// Query over active alerts
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Exact level; takes precedence over the range
    pub level: Option<RiskLevel>,
    pub min_level: Option<RiskLevel>,
    pub max_level: Option<RiskLevel>,
    pub location_id: Option<String>,
    pub category: Option<AlertCategory>,
    pub limit: Option<usize>,
}

impl AlertFilter {
    fn matches(&self, alert: &Alert) -> bool {
        let level = alert.level();
        let level_ok = match self.level {
            Some(exact) => level == exact,
            None => {
                self.min_level.map_or(true, |min| level >= min)
                    && self.max_level.map_or(true, |max| level <= max)
            }
        };
        level_ok
            && self
                .location_id
                .as_deref()
                .map_or(true, |id| alert.location_id() == id)
            && self.category.map_or(true, |c| alert.category() == c)
    }
}

/// Per-location failure inside a bulk evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFailure {
    pub location_id: String,
    pub error: String,
}

/// Counts from a bulk evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkSummary {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub resolved: usize,
    pub failures: Vec<LocationFailure>,
}

/// Turns evaluations into persisted alerts and drives their lifecycle
pub struct AlertManager {
    config: AlertConfig,
    classifier: Classifier,
    validator: Validator,
    store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
    /// Serializes every read-modify-write on one location's alerts
    location_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(
        config: AlertConfig,
        classifier: Classifier,
        store: Arc<dyn AlertStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Creating alert manager (dedup window {}h, {} thresholds)",
            config.dedup_window_hours,
            classifier.table().len()
        );
        Self {
            validator: Validator::new(config.validation.clone()),
            config,
            classifier,
            store,
            clock,
            location_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Run `work` holding the location's lock
    ///
    /// The lock entry is dropped again once no other caller holds or waits
    /// on it, so the map only tracks locations with work in flight.
    fn with_location<T>(&self, location_id: &str, work: impl FnOnce() -> T) -> T {
        let lock = self
            .location_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(location_id.to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            work()
        };

        let mut locks = self
            .location_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks
            .get(location_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(location_id);
        }
        result
    }

    #[cfg(test)]
    fn tracked_locations(&self) -> usize {
        self.location_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Validate, classify, and create, update, or resolve alerts
    pub fn evaluate_and_record(
        &self,
        snapshot: &Snapshot,
        location_name: &str,
    ) -> Result<AlertDelta, AlertError> {
        self.validator.validate(snapshot)?;
        let evaluation = self.classifier.evaluate(snapshot);
        self.with_location(snapshot.location_id(), || {
            self.record(snapshot, evaluation, location_name)
        })
    }

    /// Apply one evaluation; caller holds the location lock
    fn record(
        &self,
        snapshot: &Snapshot,
        evaluation: Evaluation,
        location_name: &str,
    ) -> Result<AlertDelta, AlertError> {
        let location_id = snapshot.location_id();
        let now = self.clock.now();

        let mut delta = AlertDelta {
            evaluation: evaluation.clone(),
            created: None,
            updated: None,
            resolved: Vec::new(),
        };

        if evaluation.is_normal() {
            delta.resolved = self.resolve_open(
                location_id,
                &self.config.system_actor,
                Some(self.config.normalized_note.clone()),
                now,
            )?;
            if !delta.resolved.is_empty() {
                info!(
                    "Quality normalized at {}; resolved {} alert(s)",
                    location_id,
                    delta.resolved.len()
                );
            }
            return Ok(delta);
        }

        let cutoff = now - Duration::hours(self.config.dedup_window_hours);
        let existing = self
            .store
            .open_alerts(location_id)?
            .into_iter()
            .filter(|a| {
                a.status() == AlertStatus::Active
                    && a.level() == evaluation.overall
                    && a.created_at() >= cutoff
            })
            .max_by_key(|a| a.created_at());

        match existing {
            Some(mut alert) => {
                alert.refresh(snapshot.clone(), &evaluation, now);
                self.store.save_alert(&alert)?;
                debug!(
                    "Updated alert {} at {} (update #{})",
                    alert.id(),
                    location_id,
                    alert.update_count()
                );
                delta.updated = Some(alert);
            }
            None => {
                let alert = Alert::open(snapshot.clone(), &evaluation, location_name, now);
                self.store.save_alert(&alert)?;
                info!(
                    "Created {} alert {} at {}",
                    evaluation.overall.name(),
                    alert.id(),
                    location_id
                );
                delta.created = Some(alert);
            }
        }

        Ok(delta)
    }

    /// Resolve open alerts; caller holds the location lock
    fn resolve_open(
        &self,
        location_id: &str,
        actor: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertError> {
        let mut resolved = Vec::new();
        for mut alert in self.store.open_alerts(location_id)? {
            if alert.resolve(actor, notes.clone(), now)? {
                self.store.save_alert(&alert)?;
                resolved.push(alert);
            }
        }
        Ok(resolved)
    }

    /// Apply one transition under the alert's location lock
    fn transition<F>(&self, id: Uuid, apply: F) -> Result<Alert, AlertError>
    where
        F: FnOnce(&mut Alert, DateTime<Utc>) -> Result<bool, AlertError>,
    {
        let location_id = self
            .store
            .alert(id)?
            .ok_or(AlertError::NotFound(id))?
            .location_id()
            .to_string();

        self.with_location(&location_id, || {
            let mut alert = self.store.alert(id)?.ok_or(AlertError::NotFound(id))?;
            if apply(&mut alert, self.clock.now())? {
                self.store.save_alert(&alert)?;
                info!("Alert {} is now {}", id, alert.status());
            } else {
                debug!("Alert {} already {}", id, alert.status());
            }
            Ok(alert)
        })
    }

    /// Acknowledge an active alert
    pub fn acknowledge(
        &self,
        id: Uuid,
        actor: &str,
        notes: Option<String>,
    ) -> Result<Alert, AlertError> {
        self.transition(id, |alert, now| alert.acknowledge(actor, notes, now))
    }

    /// Resolve an alert; resolving twice is a no-op
    pub fn resolve(
        &self,
        id: Uuid,
        actor: &str,
        notes: Option<String>,
    ) -> Result<Alert, AlertError> {
        self.transition(id, |alert, now| alert.resolve(actor, notes, now))
    }

    pub fn mark_false_positive(
        &self,
        id: Uuid,
        actor: &str,
        notes: Option<String>,
    ) -> Result<Alert, AlertError> {
        self.transition(id, |alert, now| alert.mark_false_positive(actor, notes, now))
    }

    /// Resolve every open alert at a location
    pub fn resolve_location(
        &self,
        location_id: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<Vec<Alert>, AlertError> {
        let resolved = self.with_location(location_id, || {
            self.resolve_open(location_id, actor, reason, self.clock.now())
        })?;
        info!(
            "{} resolved {} alert(s) at {}",
            actor,
            resolved.len(),
            location_id
        );
        Ok(resolved)
    }

    /// Active alert counts per level
    pub fn statistics(&self) -> Result<AlertStatistics, AlertError> {
        Ok(AlertStatistics::from_alerts(&self.store.active_alerts()?))
    }

    /// Daily creation counts of active alerts over the last `days` days
    pub fn trends(&self, days: u32) -> Result<Vec<DailyTrend>, AlertError> {
        let since = self.clock.now() - Duration::days(i64::from(days));
        let alerts = self.store.alerts_created_since(since)?;
        Ok(daily_trends(
            alerts.iter().filter(|a| a.status() == AlertStatus::Active),
        ))
    }

    /// Active alerts, most severe first, newest first within a level
    pub fn active_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AlertError> {
        let mut alerts: Vec<Alert> = self
            .store
            .active_alerts()?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        alerts.sort_by(|a, b| {
            b.level()
                .cmp(&a.level())
                .then_with(|| b.created_at().cmp(&a.created_at()))
        });
        alerts.truncate(filter.limit.unwrap_or(self.config.default_limit));
        Ok(alerts)
    }

    /// Evaluate many readings; a failing location does not stop the batch
    pub fn bulk_evaluate<'a>(
        &self,
        readings: impl IntoIterator<Item = (&'a Snapshot, &'a str)>,
    ) -> BulkSummary {
        let mut summary = BulkSummary::default();
        for (snapshot, location_name) in readings {
            summary.processed += 1;
            match self.evaluate_and_record(snapshot, location_name) {
                Ok(delta) => {
                    summary.created += usize::from(delta.created.is_some());
                    summary.updated += usize::from(delta.updated.is_some());
                    summary.resolved += delta.resolved.len();
                }
                Err(e) => {
                    warn!("Evaluation failed for {}: {}", snapshot.location_id(), e);
                    summary.failures.push(LocationFailure {
                        location_id: snapshot.location_id().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        summary
    }
}
