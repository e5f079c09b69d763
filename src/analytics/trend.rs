//! Cross-meeting trend analysis
//!
//! This module provides functionality for:
//! - Computing per-meeting deltas for any aggregate metric
//! - Classifying each step as improving, stable or declining
//! - Summarizing a series by comparing its recent half with its earlier half
//!
//! Every routine is generic over [`TrendMetric`]; there is no per-metric
//! copy of the algorithm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Thresholds;
use crate::models::{MeetingAggregate, TrendDirection, TrendMetric, TrendPoint};
use crate::utils::round_to;

/// Offset that keeps the percentage change finite around a zero baseline
const PERCENT_BASE_OFFSET: f64 = 0.001;

/// Errors that can occur during trend analysis
#[derive(Debug, Error, PartialEq)]
pub enum TrendError {
    #[error("History out of order at index {index}: {current} does not follow {previous}")]
    Ordering {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Non-finite {metric} for meeting {meeting_id}")]
    NonFinite {
        meeting_id: String,
        metric: TrendMetric,
    },
}

/// Result type for trend analysis operations
pub type TrendResult<T> = Result<T, TrendError>;

/// Half-over-half comparison of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub metric: TrendMetric,
    pub direction: TrendDirection,
    /// Change of the recent-half mean relative to the earlier-half mean
    pub change_percentage: f64,
    pub current_avg: f64,
    pub previous_avg: f64,
    pub point_count: usize,
}

/// Computes trend points over a team's time-ordered aggregates
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    epsilon: f64,
}

impl TrendAnalyzer {
    /// Create a new trend analyzer
    ///
    /// # Arguments
    /// * `epsilon` - Changes within `±epsilon` count as stable
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    #[must_use]
    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        Self::new(thresholds.trend_epsilon())
    }

    /// Mean compound trend, one point per meeting
    pub fn analyze(&self, history: &[MeetingAggregate]) -> TrendResult<Vec<TrendPoint>> {
        self.analyze_metric(history, TrendMetric::MeanCompound)
    }

    /// Trend of any aggregate metric
    ///
    /// The first point has delta 0 and is stable. Later points carry
    /// `value[i] - value[i-1]`; the direction reads that delta in the
    /// metric's own sense of better, so a falling negative ratio improves.
    ///
    /// # Errors
    /// Fails without partial output when timestamps are not strictly
    /// increasing or a value is not finite.
    pub fn analyze_metric(
        &self,
        history: &[MeetingAggregate],
        metric: TrendMetric,
    ) -> TrendResult<Vec<TrendPoint>> {
        let values = checked_values(history, metric)?;

        let points = history
            .iter()
            .zip(&values)
            .enumerate()
            .map(|(i, (aggregate, &value))| {
                let delta = if i == 0 { 0.0 } else { value - values[i - 1] };
                TrendPoint {
                    meeting_id: aggregate.meeting_id.clone(),
                    metric,
                    value,
                    delta_from_previous: delta,
                    direction: self.direction(metric, delta),
                }
            })
            .collect();

        Ok(points)
    }

    /// Trends for several metrics, grouped by metric in the given order
    pub fn analyze_all(
        &self,
        history: &[MeetingAggregate],
        metrics: &[TrendMetric],
    ) -> TrendResult<Vec<TrendPoint>> {
        let mut points = Vec::with_capacity(history.len() * metrics.len());
        for &metric in metrics {
            points.extend(self.analyze_metric(history, metric)?);
        }
        Ok(points)
    }

    /// Compare the recent half of the series with the earlier half
    ///
    /// Returns `None` with fewer than two meetings.
    pub fn summarize(
        &self,
        history: &[MeetingAggregate],
        metric: TrendMetric,
    ) -> TrendResult<Option<TrendSummary>> {
        let values = checked_values(history, metric)?;
        if values.len() < 2 {
            return Ok(None);
        }

        let mid = values.len() / 2;
        let previous_avg = mean(&values[..mid]);
        let current_avg = mean(&values[mid..]);
        let change_percentage =
            (current_avg - previous_avg) / (previous_avg.abs() + PERCENT_BASE_OFFSET) * 100.0;

        let oriented = if metric.higher_is_better() {
            change_percentage
        } else {
            -change_percentage
        };

        Ok(Some(TrendSummary {
            metric,
            direction: TrendDirection::from_change(oriented, summary_band_pct(metric)),
            change_percentage: round_to(change_percentage, 2),
            current_avg: round_to(current_avg, 4),
            previous_avg: round_to(previous_avg, 4),
            point_count: values.len(),
        }))
    }

    fn direction(&self, metric: TrendMetric, delta: f64) -> TrendDirection {
        let oriented = if metric.higher_is_better() { delta } else { -delta };
        TrendDirection::from_change(oriented, self.epsilon)
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(0.02)
    }
}

/// Percentage change a summary must exceed to leave "stable"
fn summary_band_pct(metric: TrendMetric) -> f64 {
    match metric {
        TrendMetric::MeanCompound | TrendMetric::NegativeRatio | TrendMetric::Engagement => 10.0,
        TrendMetric::ParticipationBalance => 5.0,
        TrendMetric::UnitCount => 15.0,
    }
}

fn checked_values(history: &[MeetingAggregate], metric: TrendMetric) -> TrendResult<Vec<f64>> {
    for (i, pair) in history.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(TrendError::Ordering {
                index: i + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }

    history
        .iter()
        .map(|aggregate| {
            let value = metric.value(aggregate);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(TrendError::NonFinite {
                    meeting_id: aggregate.meeting_id.clone(),
                    metric,
                })
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
