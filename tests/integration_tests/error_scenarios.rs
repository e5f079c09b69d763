//! Error scenario integration tests
//!
//! Tests invalid input and how it surfaces:
//! 1. Bad configuration
//! 2. Malformed transcripts
//! 3. Unit/score mismatches
//! 4. Out-of-order history

use meetpulse::analytics::{Lexicon, RiskDetector, TrendAnalyzer, TrendError};
use meetpulse::config::{Config, ConfigError, ThresholdSettings};
use meetpulse::error::{Error, ErrorCategory, MeetpulseErrorTrait};
use meetpulse::models::SentimentScore;
use meetpulse::pipeline::AnalyticsPipeline;
use meetpulse::transcript::{self, TranscriptError};

use crate::common::{aggregate, meeting_info, units};

#[test]
fn test_invalid_threshold_fails_before_processing() {
    let mut config = Config::default();
    config.thresholds.decline_window = 0;

    let err = AnalyticsPipeline::new(&config, Lexicon::default()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(!err.is_recoverable());
}

#[test]
fn test_zero_concurrency_rejected() {
    let mut config = Config::default();
    config.pipeline.max_concurrent = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "pipeline.max_concurrent",
            ..
        })
    ));
}

#[test]
fn test_malformed_transcripts() {
    assert_eq!(transcript::validate(""), Err(TranscriptError::Empty));

    let err: Error = transcript::validate("just some notes without any speakers in them")
        .unwrap_err()
        .into();
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[test]
fn test_score_for_unknown_unit_rejected() {
    let detector = RiskDetector::new(ThresholdSettings::default().build().unwrap());
    let current = aggregate("m1", 1, 0.0);
    let units = units(&["hello there"]);
    let scores = vec![SentimentScore::neutral("u9")];

    assert!(detector.detect(&current, &units, &scores, &[]).is_err());
}

#[test]
fn test_unordered_history_is_rejected() {
    let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default()).unwrap();
    let history = vec![aggregate("w1", 1, 0.2), aggregate("w0", 0, 0.4)];

    let err = pipeline
        .analyze_units(&meeting_info("core", "w2", 2), &units(&["Fine."]), &history)
        .unwrap_err();
    assert!(matches!(err, Error::Risk(_)));
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[test]
fn test_trend_ordering_error_returns_nothing() {
    let history = vec![aggregate("w0", 0, 0.5), aggregate("w2", 2, 0.3), aggregate("w1", 1, 0.3)];
    let result = TrendAnalyzer::default().analyze(&history);
    assert!(matches!(result, Err(TrendError::Ordering { index: 2, .. })));
}
