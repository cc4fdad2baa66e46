//! Trend Estimation

use crate::statistics::{deltas, WindowStats};
use serde::{Deserialize, Serialize};
use water_quality::{Direction, Parameter, Snapshot};

/// Values considered by the estimator
pub const TREND_WINDOW: usize = 14;

const MIN_SAMPLES: usize = 3;
const MIN_CONFIDENCE_SAMPLES: usize = 5;
const RECENCY_WEIGHT: f64 = 1.1;
const CONSISTENCY_DELTAS: usize = 5;

/// Combined trend switches to blended linear/exponential above this confidence
const BLEND_CONFIDENCE: f64 = 0.7;

/// Direction and strength of change in one parameter's recent history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEstimate {
    /// Recency-weighted least-squares slope (units per sample)
    pub linear: f64,
    /// Mean second difference
    pub exponential: f64,
    /// 0 (no evidence) to 1
    pub confidence: f64,
    pub samples: usize,
}

impl TrendEstimate {
    /// Estimate from the last `window` values of a parameter in newest-first history
    pub fn from_history(history: &[Snapshot], parameter: Parameter, window: usize) -> Self {
        let mut values: Vec<f64> = history
            .iter()
            .take(window)
            .filter_map(|s| s.get(parameter))
            .collect();
        values.reverse();
        estimate_trend(&values)
    }

    /// Per-day change used for projection
    pub fn combined(&self) -> f64 {
        if self.confidence > BLEND_CONFIDENCE {
            0.7 * self.linear + 0.3 * self.exponential
        } else {
            self.linear
        }
    }
}

/// Estimate a trend over values ordered oldest to newest
///
/// Only the most recent [`TREND_WINDOW`] values are used.
pub fn estimate_trend(values: &[f64]) -> TrendEstimate {
    let window = &values[values.len().saturating_sub(TREND_WINDOW)..];
    let n = window.len();
    if n < MIN_SAMPLES {
        return TrendEstimate {
            samples: n,
            ..Default::default()
        };
    }

    let linear = weighted_slope(window);
    let second: Vec<f64> = window
        .windows(3)
        .map(|w| w[2] - 2.0 * w[1] + w[0])
        .collect();
    let exponential = second.iter().sum::<f64>() / second.len() as f64;

    TrendEstimate {
        linear,
        exponential,
        confidence: confidence(window, linear),
        samples: n,
    }
}

/// Least-squares slope with weights growing 1.1x per step toward the newest value
fn weighted_slope(values: &[f64]) -> f64 {
    let weights: Vec<f64> = (0..values.len())
        .map(|i| RECENCY_WEIGHT.powi(i as i32))
        .collect();
    let total: f64 = weights.iter().sum();

    let x_mean = weights
        .iter()
        .enumerate()
        .map(|(i, w)| w * i as f64)
        .sum::<f64>()
        / total;
    let y_mean = weights.iter().zip(values).map(|(w, y)| w * y).sum::<f64>() / total;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, (w, y)) in weights.iter().zip(values).enumerate() {
        let dx = i as f64 - x_mean;
        num += w * dx * (y - y_mean);
        den += w * dx * dx;
    }

    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn confidence(window: &[f64], slope: f64) -> f64 {
    if window.len() < MIN_CONFIDENCE_SAMPLES {
        return 0.0;
    }

    let stats = WindowStats::compute(window);
    if stats.is_flat() || slope == 0.0 {
        return 0.0;
    }

    let stability = stats
        .coefficient_of_variation()
        .map_or(0.0, |cv| (1.0 - cv).max(0.0));

    let steps: Vec<f64> = deltas(window).collect();
    let recent = &steps[steps.len().saturating_sub(CONSISTENCY_DELTAS)..];
    let agreeing = recent
        .iter()
        .filter(|d| **d != 0.0 && d.signum() == slope.signum())
        .count();
    let consistency = agreeing as f64 / recent.len() as f64;

    ((stability + consistency) / 2.0).clamp(0.0, 1.0)
}

/// Qualitative trend of a forecast parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Improving,
    Declining,
    Stable,
}

impl TrendLabel {
    const MIN_SLOPE: f64 = 0.1;
    const MIN_CONFIDENCE: f64 = 0.3;

    /// Label a trend using the parameter's direction convention
    ///
    /// `center` is the optimum for centered parameters; moving toward it
    /// counts as improving.
    pub fn classify(estimate: &TrendEstimate, direction: Direction, latest: f64, center: f64) -> Self {
        if estimate.linear.abs() < Self::MIN_SLOPE || estimate.confidence < Self::MIN_CONFIDENCE {
            return TrendLabel::Stable;
        }

        let rising = estimate.linear > 0.0;
        let improving = match direction {
            Direction::HigherIsWorse => !rising,
            Direction::LowerIsWorse => rising,
            Direction::CenteredIsBest => latest != center && (latest > center) != rising,
        };

        if improving {
            TrendLabel::Improving
        } else {
            TrendLabel::Declining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    #[test]
    fn test_too_few_values() {
        let estimate = estimate_trend(&[1.0, 2.0]);
        assert_eq!(estimate.linear, 0.0);
        assert_eq!(estimate.confidence, 0.0);
        assert_eq!(estimate.samples, 2);
    }

    #[test]
    fn test_straight_line() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let estimate = estimate_trend(&values);
        assert!((estimate.linear - 1.0).abs() < 1e-9);
        assert!(estimate.exponential.abs() < 1e-12);
        assert!(estimate.confidence > 0.7 && estimate.confidence < 0.8);
    }

    #[test]
    fn test_acceleration() {
        let values: Vec<f64> = (0..7).map(|i| f64::from(i * i)).collect();
        let estimate = estimate_trend(&values);
        assert!((estimate.exponential - 2.0).abs() < 1e-12);
        assert!(estimate.linear > 0.0);
    }

    #[test]
    fn test_flat_history_has_no_confidence() {
        let estimate = estimate_trend(&[8.0; 14]);
        assert!(estimate.linear.abs() < 1e-12);
        assert_eq!(estimate.exponential, 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_confidence_needs_five_values() {
        let estimate = estimate_trend(&[1.0, 2.0, 3.0, 4.0]);
        assert!(estimate.linear > 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_window_uses_most_recent_values() {
        // Old values fall, the last 14 rise steadily
        let mut values: Vec<f64> = (0..20).map(|i| 100.0 - f64::from(i)).collect();
        values.extend((0..14).map(|i| 50.0 + f64::from(i)));
        let estimate = estimate_trend(&values);
        assert_eq!(estimate.samples, TREND_WINDOW);
        assert!((estimate.linear - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_history_orders_oldest_first() {
        let now = Utc::now();
        // Newest first, values rising over time
        let history: Vec<Snapshot> = (0..6)
            .map(|i| {
                Snapshot::new(
                    "kanpur-01",
                    now - Duration::hours(i64::from(i)),
                    [(Parameter::Nitrate, 10.0 - f64::from(i))],
                )
            })
            .collect();
        let estimate = TrendEstimate::from_history(&history, Parameter::Nitrate, TREND_WINDOW);
        assert!((estimate.linear - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        let rising = TrendEstimate {
            linear: 0.5,
            exponential: 0.0,
            confidence: 0.8,
            samples: 14,
        };
        let falling = TrendEstimate {
            linear: -0.5,
            ..rising
        };

        assert_eq!(
            TrendLabel::classify(&rising, Direction::HigherIsWorse, 5.0, 0.0),
            TrendLabel::Declining
        );
        assert_eq!(
            TrendLabel::classify(&rising, Direction::LowerIsWorse, 5.0, 0.0),
            TrendLabel::Improving
        );
        // pH above the optimum and falling toward it
        assert_eq!(
            TrendLabel::classify(&falling, Direction::CenteredIsBest, 8.9, 7.5),
            TrendLabel::Improving
        );
        assert_eq!(
            TrendLabel::classify(&rising, Direction::CenteredIsBest, 8.9, 7.5),
            TrendLabel::Declining
        );

        let weak = TrendEstimate {
            confidence: 0.2,
            ..rising
        };
        assert_eq!(
            TrendLabel::classify(&weak, Direction::HigherIsWorse, 5.0, 0.0),
            TrendLabel::Stable
        );
    }

    proptest! {
        #[test]
        fn prop_confidence_is_bounded(values in prop::collection::vec(0.0f64..1000.0, 0..30)) {
            let estimate = estimate_trend(&values);
            prop_assert!((0.0..=1.0).contains(&estimate.confidence));
            prop_assert!(estimate.samples <= TREND_WINDOW);
        }
    }
}
