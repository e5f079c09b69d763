//! Rule-based risk detection for a single meeting
//!
//! Four independent rules run against the meeting aggregate, its scored
//! units and the team's prior history:
//!
//! | Rule | Fires when | Severity |
//! |------|------------|----------|
//! | `NEGATIVE_SPIKE` | `negative_ratio > negative_spike_ratio` | by overshoot ratio |
//! | `SENTIMENT_DECLINE` | window mean minus current `> decline_delta` | by overshoot ratio |
//! | `LOW_ENGAGEMENT` | `unit_count <` rate × duration | MEDIUM |
//! | `KEYWORD_ALERT` | any unit contains an alert keyword | HIGH |
//!
//! A rule that lacks the data it needs is reported in `skipped_rules`
//! rather than failing the run.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::analytics::aggregate::{index_scores, negative_units, AggregateError};
use crate::config::Thresholds;
use crate::models::{
    MeetingAggregate, RiskFlag, RiskKind, RiskReport, SentimentScore, Severity, SkippedRule,
    TextUnit,
};

/// Invalid input handed to the detector
#[derive(Debug, Error, PartialEq)]
pub enum RiskError {
    #[error("Unit/score mismatch: {0}")]
    Units(#[from] AggregateError),

    #[error("History is not in chronological order at index {index}: {current} follows {previous}")]
    HistoryOrdering {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("History entry {meeting_id} at {timestamp} is not earlier than the current meeting")]
    HistoryNotPrior {
        meeting_id: String,
        timestamp: DateTime<Utc>,
    },

    #[error("Non-finite {field} in aggregate {meeting_id}")]
    NonFinite {
        meeting_id: String,
        field: &'static str,
    },
}

/// Applies the threshold rules to one meeting
#[derive(Debug, Clone)]
pub struct RiskDetector {
    thresholds: Thresholds,
}

impl RiskDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Evaluate every rule for one meeting
    ///
    /// `history` holds the team's earlier aggregates, oldest first. It is
    /// only read.
    pub fn detect(
        &self,
        aggregate: &MeetingAggregate,
        units: &[TextUnit],
        scores: &[SentimentScore],
        history: &[MeetingAggregate],
    ) -> Result<RiskReport, RiskError> {
        validate_aggregate(aggregate)?;
        validate_history(aggregate, history)?;
        index_scores(units, scores)?;

        let mut report = RiskReport {
            meeting_id: aggregate.meeting_id.clone(),
            flags: Vec::new(),
            skipped_rules: Vec::new(),
        };

        let outcomes = [
            (RiskKind::NegativeSpike, self.negative_spike(aggregate, scores)),
            (RiskKind::SentimentDecline, self.sentiment_decline(aggregate, history)),
            (RiskKind::LowEngagement, self.low_engagement(aggregate)),
            (RiskKind::KeywordAlert, self.keyword_alert(aggregate, units)),
        ];

        for (kind, outcome) in outcomes {
            match outcome {
                RuleOutcome::Flag(flag) => report.flags.push(flag),
                RuleOutcome::Clear => {}
                RuleOutcome::Skipped(reason) => {
                    report.skipped_rules.push(SkippedRule { kind, reason });
                }
            }
        }

        tracing::debug!(
            meeting_id = %aggregate.meeting_id,
            flags = report.flags.len(),
            skipped = report.skipped_rules.len(),
            "Risk detection complete"
        );

        Ok(report)
    }

    fn negative_spike(&self, aggregate: &MeetingAggregate, scores: &[SentimentScore]) -> RuleOutcome {
        let threshold = self.thresholds.negative_spike_ratio();
        if aggregate.negative_ratio <= threshold {
            return RuleOutcome::Clear;
        }

        let evidence = negative_units(scores, self.thresholds.negative_unit_threshold())
            .into_iter()
            .map(str::to_string)
            .collect();

        RuleOutcome::Flag(RiskFlag {
            meeting_id: aggregate.meeting_id.clone(),
            kind: RiskKind::NegativeSpike,
            severity: Severity::from_ratio(aggregate.negative_ratio / threshold),
            evidence,
        })
    }

    fn sentiment_decline(
        &self,
        aggregate: &MeetingAggregate,
        history: &[MeetingAggregate],
    ) -> RuleOutcome {
        if history.is_empty() {
            return RuleOutcome::Skipped("no prior meetings in history".to_string());
        }

        let window = self.thresholds.decline_window().min(history.len());
        let recent = &history[history.len() - window..];
        let baseline = recent.iter().map(|a| a.mean_compound).sum::<f64>() / window as f64;
        let drop = baseline - aggregate.mean_compound;
        let delta = self.thresholds.decline_delta();

        if drop <= delta {
            return RuleOutcome::Clear;
        }

        RuleOutcome::Flag(RiskFlag {
            meeting_id: aggregate.meeting_id.clone(),
            kind: RiskKind::SentimentDecline,
            severity: Severity::from_ratio(drop / delta),
            evidence: vec![format!(
                "mean_compound {:.3} vs {:.3} over last {window} meeting(s)",
                aggregate.mean_compound, baseline
            )],
        })
    }

    fn low_engagement(&self, aggregate: &MeetingAggregate) -> RuleOutcome {
        let Some(rate) = self.thresholds.low_engagement_baseline() else {
            return RuleOutcome::Skipped("no engagement baseline configured".to_string());
        };
        let Some(duration) = aggregate.duration_minutes else {
            return RuleOutcome::Skipped("meeting duration unknown".to_string());
        };

        let baseline = rate * f64::from(duration);
        if (aggregate.unit_count as f64) >= baseline {
            return RuleOutcome::Clear;
        }

        RuleOutcome::Flag(RiskFlag {
            meeting_id: aggregate.meeting_id.clone(),
            kind: RiskKind::LowEngagement,
            severity: Severity::Medium,
            evidence: vec![format!(
                "{} unit(s) in {duration} min, expected at least {baseline:.1}",
                aggregate.unit_count
            )],
        })
    }

    fn keyword_alert(&self, aggregate: &MeetingAggregate, units: &[TextUnit]) -> RuleOutcome {
        let Some(pattern) = self.thresholds.keyword_pattern() else {
            return RuleOutcome::Skipped("no alert keywords configured".to_string());
        };

        let evidence: Vec<String> = units
            .iter()
            .filter(|u| pattern.is_match(&u.text))
            .map(|u| u.id.clone())
            .collect();

        if evidence.is_empty() {
            return RuleOutcome::Clear;
        }

        RuleOutcome::Flag(RiskFlag {
            meeting_id: aggregate.meeting_id.clone(),
            kind: RiskKind::KeywordAlert,
            severity: Severity::High,
            evidence,
        })
    }
}

enum RuleOutcome {
    Flag(RiskFlag),
    Clear,
    Skipped(String),
}

fn validate_aggregate(aggregate: &MeetingAggregate) -> Result<(), RiskError> {
    let fields = [
        ("mean_compound", aggregate.mean_compound),
        ("negative_ratio", aggregate.negative_ratio),
        ("mean_engagement", aggregate.mean_engagement),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(RiskError::NonFinite {
                meeting_id: aggregate.meeting_id.clone(),
                field,
            });
        }
    }
    Ok(())
}

fn validate_history(
    current: &MeetingAggregate,
    history: &[MeetingAggregate],
) -> Result<(), RiskError> {
    for (index, pair) in history.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(RiskError::HistoryOrdering {
                index: index + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }

    for entry in history {
        validate_aggregate(entry)?;
        if entry.timestamp >= current.timestamp {
            return Err(RiskError::HistoryNotPrior {
                meeting_id: entry.meeting_id.clone(),
                timestamp: entry.timestamp,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdSettings;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn aggregate(id: &str, day: i64, mean_compound: f64, negative_ratio: f64) -> MeetingAggregate {
        MeetingAggregate {
            meeting_id: id.to_string(),
            timestamp: base_time() + Duration::days(day),
            mean_compound,
            negative_ratio,
            unit_count: 0,
            duration_minutes: None,
            word_count: 0,
            participation_balance: 1.0,
            mean_engagement: 50.0,
            speaker_engagement: Default::default(),
        }
    }

    fn detector(settings: ThresholdSettings) -> RiskDetector {
        RiskDetector::new(settings.build().unwrap())
    }

    #[test]
    fn test_negative_spike_high_at_double_threshold() {
        let report = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 0, -0.3, 0.70), &[], &[], &[])
            .unwrap();

        let flag = report.flag(RiskKind::NegativeSpike).unwrap();
        assert_eq!(flag.severity, Severity::High);
    }

    #[test]
    fn test_negative_spike_severity_bands() {
        let detector = detector(ThresholdSettings::default());
        let severity = |ratio: f64| {
            detector
                .detect(&aggregate("m1", 0, 0.0, ratio), &[], &[], &[])
                .unwrap()
                .flag(RiskKind::NegativeSpike)
                .map(|f| f.severity)
        };

        assert_eq!(severity(0.35), None);
        assert_eq!(severity(0.40), Some(Severity::Low));
        assert_eq!(severity(0.60), Some(Severity::Medium));
        assert_eq!(severity(0.95), Some(Severity::High));
    }

    #[test]
    fn test_negative_spike_evidence_lists_negative_units() {
        let units = vec![TextUnit::new("u1", "a"), TextUnit::new("u2", "b")];
        let scores = vec![
            SentimentScore {
                unit_id: "u1".to_string(),
                positive: 0.0,
                neutral: 0.2,
                negative: 0.8,
                compound: -0.7,
            },
            SentimentScore::neutral("u2"),
        ];
        let report = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 0, -0.35, 0.5), &units, &scores, &[])
            .unwrap();

        assert_eq!(
            report.flag(RiskKind::NegativeSpike).unwrap().evidence,
            vec!["u1".to_string()]
        );
    }

    #[test]
    fn test_decline_skipped_without_history() {
        let report = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 0, -0.9, 0.0), &[], &[], &[])
            .unwrap();

        assert!(report.flag(RiskKind::SentimentDecline).is_none());
        assert!(report.is_skipped(RiskKind::SentimentDecline));
    }

    #[test]
    fn test_decline_uses_last_window_meetings() {
        let history = vec![
            aggregate("h1", 0, -0.8, 0.0),
            aggregate("h2", 1, 0.5, 0.0),
            aggregate("h3", 2, 0.4, 0.0),
            aggregate("h4", 3, 0.6, 0.0),
        ];
        let detector = detector(ThresholdSettings::default());

        // window mean is 0.5; h1 falls outside the window
        let steady = detector
            .detect(&aggregate("m1", 4, 0.4, 0.0), &[], &[], &history)
            .unwrap();
        assert!(steady.flag(RiskKind::SentimentDecline).is_none());
        assert!(!steady.is_skipped(RiskKind::SentimentDecline));

        let medium = detector
            .detect(&aggregate("m1", 4, 0.25, 0.0), &[], &[], &history)
            .unwrap();
        assert_eq!(
            medium.flag(RiskKind::SentimentDecline).unwrap().severity,
            Severity::Medium
        );

        let high = detector
            .detect(&aggregate("m1", 4, 0.1, 0.0), &[], &[], &history)
            .unwrap();
        assert_eq!(
            high.flag(RiskKind::SentimentDecline).unwrap().severity,
            Severity::High
        );
    }

    #[test]
    fn test_decline_with_single_prior_meeting() {
        let history = vec![aggregate("h1", 0, 0.5, 0.0)];
        let report = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 1, 0.3, 0.0), &[], &[], &history)
            .unwrap();
        assert_eq!(
            report.flag(RiskKind::SentimentDecline).unwrap().severity,
            Severity::Low
        );
    }

    #[test]
    fn test_low_engagement() {
        let settings = ThresholdSettings {
            low_engagement_baseline: Some(0.5),
            ..Default::default()
        };
        let detector = detector(settings);

        let mut quiet = aggregate("m1", 0, 0.1, 0.0);
        quiet.unit_count = 10;
        quiet.duration_minutes = Some(60);
        let report = detector.detect(&quiet, &[], &[], &[]).unwrap();
        assert_eq!(
            report.flag(RiskKind::LowEngagement).unwrap().severity,
            Severity::Medium
        );

        quiet.unit_count = 30;
        let report = detector.detect(&quiet, &[], &[], &[]).unwrap();
        assert!(report.flag(RiskKind::LowEngagement).is_none());

        quiet.duration_minutes = None;
        let report = detector.detect(&quiet, &[], &[], &[]).unwrap();
        assert!(report.is_skipped(RiskKind::LowEngagement));
    }

    #[test]
    fn test_low_engagement_skipped_without_baseline() {
        let mut agg = aggregate("m1", 0, 0.1, 0.0);
        agg.duration_minutes = Some(45);
        let report = detector(ThresholdSettings::default())
            .detect(&agg, &[], &[], &[])
            .unwrap();
        assert!(report.is_skipped(RiskKind::LowEngagement));
    }

    #[test]
    fn test_keyword_alert_ignores_sentiment() {
        let settings = ThresholdSettings {
            alert_keywords: vec!["resign".to_string()],
            ..Default::default()
        };
        let units = vec![
            TextUnit::new("u1", "Great news, I'm so happy!"),
            TextUnit::new("u2", "Honestly I'm thrilled, I plan to Resign and travel!"),
            TextUnit::new("u3", "Her resignation letter arrived"),
        ];
        let scores: Vec<_> = units
            .iter()
            .map(|u| SentimentScore {
                unit_id: u.id.clone(),
                positive: 0.6,
                neutral: 0.4,
                negative: 0.0,
                compound: 0.9,
            })
            .collect();

        let report = detector(settings)
            .detect(&aggregate("m1", 0, 0.9, 0.0), &units, &scores, &[])
            .unwrap();

        let flag = report.flag(RiskKind::KeywordAlert).unwrap();
        assert_eq!(flag.severity, Severity::High);
        assert_eq!(flag.evidence, vec!["u2".to_string()]);
    }

    #[test]
    fn test_keyword_alert_skipped_without_keywords() {
        let report = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 0, 0.0, 0.0), &[], &[], &[])
            .unwrap();
        assert!(report.is_skipped(RiskKind::KeywordAlert));
    }

    #[test]
    fn test_unordered_history_rejected() {
        let history = vec![aggregate("h1", 2, 0.1, 0.0), aggregate("h2", 1, 0.1, 0.0)];
        let err = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 5, 0.0, 0.0), &[], &[], &history)
            .unwrap_err();
        assert!(matches!(err, RiskError::HistoryOrdering { index: 1, .. }));
    }

    #[test]
    fn test_history_after_meeting_rejected() {
        let history = vec![aggregate("h1", 3, 0.1, 0.0)];
        let err = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 3, 0.0, 0.0), &[], &[], &history)
            .unwrap_err();
        assert!(matches!(err, RiskError::HistoryNotPrior { .. }));
    }

    #[test]
    fn test_non_finite_aggregate_rejected() {
        let err = detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 0, f64::NAN, 0.0), &[], &[], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            RiskError::NonFinite {
                field: "mean_compound",
                ..
            }
        ));
    }

    #[test]
    fn test_history_is_not_mutated() {
        let history = vec![aggregate("h1", 0, 0.5, 0.1), aggregate("h2", 1, 0.6, 0.1)];
        let snapshot = history.clone();
        detector(ThresholdSettings::default())
            .detect(&aggregate("m1", 2, -0.5, 0.9), &[], &[], &history)
            .unwrap();
        assert_eq!(history, snapshot);
    }
}
