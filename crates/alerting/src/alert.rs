//! Alert Records and Status State Machine

use crate::message::AlertMessage;
use crate::AlertError;
use chrono::{DateTime, Utc};
use risk_classifier::{Evaluation, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use water_quality::{Parameter, Snapshot};

/// Alert status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    /// No transition leaves a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::FalsePositive)
    }

    /// Active or acknowledged
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Pollution,
    Contamination,
    Chemical,
    Biological,
    Physical,
    System,
}

const LEVEL_CATEGORIES: [AlertCategory; 5] = [
    AlertCategory::System,
    AlertCategory::Chemical,
    AlertCategory::Pollution,
    AlertCategory::Contamination,
    AlertCategory::Biological,
];

impl AlertCategory {
    /// Category assigned to alerts raised at a risk level
    pub fn for_level(level: RiskLevel) -> Self {
        LEVEL_CATEGORIES[level.index()]
    }
}

/// Legacy four-step severity derived from the risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Normal | RiskLevel::Advisory => Severity::Low,
            RiskLevel::Warning => Severity::Medium,
            RiskLevel::Critical => Severity::High,
            RiskLevel::Emergency => Severity::Critical,
        }
    }
}

/// Who raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Automated,
    Manual,
}

/// Lifecycle action recorded in the alert's log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    Acknowledged,
    Resolved,
    FalsePositive,
}

/// Append-only action log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    pub action: AlertAction,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Parameters above level 1 at the time of the last evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSummary {
    pub exceeded: Vec<Parameter>,
    pub count: usize,
}

impl ThresholdSummary {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let exceeded: Vec<Parameter> = evaluation
            .exceedances()
            .iter()
            .map(|r| r.parameter)
            .collect();
        Self {
            count: exceeded.len(),
            exceeded,
        }
    }

    /// Display names joined with commas
    pub fn names(&self) -> String {
        self.exceeded
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A persisted alert
///
/// Status, resolution fields, and the action log change only through the
/// lifecycle manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    id: Uuid,
    location_id: String,
    location_name: String,
    category: AlertCategory,
    level: RiskLevel,
    severity: Severity,
    source: AlertSource,
    title: String,
    message: String,
    snapshot: Snapshot,
    thresholds: ThresholdSummary,
    status: AlertStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
    acknowledged_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by: Option<String>,
    update_count: u32,
    actions: Vec<ActionEntry>,
}

impl Alert {
    /// New active alert for an evaluation above level 1
    pub(crate) fn open(
        snapshot: Snapshot,
        evaluation: &Evaluation,
        location_name: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let level = evaluation.overall;
        let message = AlertMessage::from_evaluation(evaluation, location_name);
        Self {
            id: Uuid::new_v4(),
            location_id: snapshot.location_id().to_string(),
            location_name: location_name.to_string(),
            category: AlertCategory::for_level(level),
            level,
            severity: Severity::for_level(level),
            source: AlertSource::Automated,
            title: message.title,
            message: message.body,
            snapshot,
            thresholds: ThresholdSummary::from_evaluation(evaluation),
            status: AlertStatus::Active,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            update_count: 0,
            actions: Vec::new(),
        }
    }

    /// Replace the reading of a deduplicated alert
    pub(crate) fn refresh(&mut self, snapshot: Snapshot, evaluation: &Evaluation, now: DateTime<Utc>) {
        let message = AlertMessage::from_evaluation(evaluation, &self.location_name);
        self.snapshot = snapshot;
        self.message = message.body;
        self.thresholds = ThresholdSummary::from_evaluation(evaluation);
        self.update_count += 1;
        self.updated_at = now;
    }

    /// Returns `false` when already acknowledged
    pub(crate) fn acknowledge(
        &mut self,
        actor: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, AlertError> {
        match self.status {
            AlertStatus::Acknowledged => Ok(false),
            AlertStatus::Active => {
                self.status = AlertStatus::Acknowledged;
                self.acknowledged_at = Some(now);
                self.acknowledged_by = Some(actor.to_string());
                self.record(AlertAction::Acknowledged, actor, notes, now);
                Ok(true)
            }
            from => Err(self.invalid(from, AlertStatus::Acknowledged)),
        }
    }

    /// Returns `false` when already resolved
    pub(crate) fn resolve(
        &mut self,
        actor: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, AlertError> {
        match self.status {
            AlertStatus::Resolved => Ok(false),
            AlertStatus::Active | AlertStatus::Acknowledged => {
                self.status = AlertStatus::Resolved;
                self.resolved_at = Some(now);
                self.resolved_by = Some(actor.to_string());
                self.record(AlertAction::Resolved, actor, notes, now);
                Ok(true)
            }
            from => Err(self.invalid(from, AlertStatus::Resolved)),
        }
    }

    pub(crate) fn mark_false_positive(
        &mut self,
        actor: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<bool, AlertError> {
        match self.status {
            AlertStatus::FalsePositive => Ok(false),
            AlertStatus::Active => {
                self.status = AlertStatus::FalsePositive;
                self.resolved_at = Some(now);
                self.resolved_by = Some(actor.to_string());
                self.record(AlertAction::FalsePositive, actor, notes, now);
                Ok(true)
            }
            from => Err(self.invalid(from, AlertStatus::FalsePositive)),
        }
    }

    fn record(&mut self, action: AlertAction, actor: &str, notes: Option<String>, now: DateTime<Utc>) {
        self.updated_at = now;
        self.actions.push(ActionEntry {
            action,
            actor: actor.to_string(),
            timestamp: now,
            notes,
        });
    }

    fn invalid(&self, from: AlertStatus, to: AlertStatus) -> AlertError {
        AlertError::InvalidTransition {
            id: self.id,
            from,
            to,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    pub fn category(&self) -> AlertCategory {
        self.category
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn source(&self) -> AlertSource {
        self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Parameter values behind the current message
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn thresholds(&self) -> &ThresholdSummary {
        &self.thresholds
    }

    pub fn status(&self) -> AlertStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn acknowledged_at(&self) -> Option<DateTime<Utc>> {
        self.acknowledged_at
    }

    pub fn acknowledged_by(&self) -> Option<&str> {
        self.acknowledged_by.as_deref()
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn resolved_by(&self) -> Option<&str> {
        self.resolved_by.as_deref()
    }

    /// Number of deduplicated re-evaluations folded into this alert
    pub fn update_count(&self) -> u32 {
        self.update_count
    }

    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }
}
