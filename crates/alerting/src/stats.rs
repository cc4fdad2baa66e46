//! Alert Statistics and Trends

use crate::{Alert, AlertStatus};
use chrono::NaiveDate;
use risk_classifier::RiskLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// Active alert count at one level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub level: RiskLevel,
    pub name: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// Active alerts per level, always one row per level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatistics {
    pub by_level: Vec<LevelCount>,
    pub total_active: usize,
    /// Active alerts at level 4 or above
    pub critical_count: usize,
}

impl AlertStatistics {
    pub(crate) fn from_alerts(alerts: &[Alert]) -> Self {
        let mut counts = [0usize; 5];
        for alert in alerts.iter().filter(|a| a.status() == AlertStatus::Active) {
            counts[alert.level().index()] += 1;
        }

        let by_level: Vec<LevelCount> = RiskLevel::ALL
            .iter()
            .map(|&level| LevelCount {
                level,
                name: level.name(),
                label: level.label(),
                count: counts[level.index()],
            })
            .collect();

        Self {
            total_active: counts.iter().sum(),
            critical_count: by_level
                .iter()
                .filter(|row| row.level >= RiskLevel::Critical)
                .map(|row| row.count)
                .sum(),
            by_level,
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        self.by_level[level.index()].count
    }
}

/// Alert creations on one UTC calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    pub date: NaiveDate,
    /// Only levels with at least one alert
    pub levels: BTreeMap<RiskLevel, usize>,
    pub total: usize,
}

pub(crate) fn daily_trends<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Vec<DailyTrend> {
    let mut days: BTreeMap<NaiveDate, BTreeMap<RiskLevel, usize>> = BTreeMap::new();
    for alert in alerts {
        *days
            .entry(alert.created_at().date_naive())
            .or_default()
            .entry(alert.level())
            .or_default() += 1;
    }

    days.into_iter()
        .map(|(date, levels)| DailyTrend {
            date,
            total: levels.values().sum(),
            levels,
        })
        .collect()
}
