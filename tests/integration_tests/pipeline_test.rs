//! End-to-end pipeline integration tests
//!
//! Tests the complete workflow:
//! 1. Transcript validation and segmentation
//! 2. Concurrent sentiment scoring
//! 3. Aggregation and risk detection
//! 4. Trend analysis over team history
//! 5. Report rendering

use meetpulse::analytics::Lexicon;
use meetpulse::config::Config;
use meetpulse::models::{RiskKind, RiskLevel, Severity, TrendDirection, TrendMetric};
use meetpulse::pipeline::AnalyticsPipeline;
use meetpulse::report::{render_json, DigestRenderer};
use meetpulse::transcript;

use super::fixtures::{RETRO_TRANSCRIPT, SPIKE_LINES, STANDUP_TRANSCRIPT};
use crate::common::{aggregate, meeting_info, units};

fn pipeline_with_keywords(keywords: &[&str]) -> AnalyticsPipeline {
    let mut config = Config::default();
    config.thresholds.alert_keywords = keywords.iter().map(|k| k.to_string()).collect();
    AnalyticsPipeline::new(&config, Lexicon::default()).unwrap()
}

// ============================================================================
// Transcript → Bundle
// ============================================================================

#[tokio::test]
async fn test_positive_standup_has_no_flags() {
    transcript::validate(STANDUP_TRANSCRIPT).unwrap();
    let units = transcript::parse(STANDUP_TRANSCRIPT);
    assert_eq!(units.len(), 5);

    let bundle = pipeline_with_keywords(&[])
        .analyze_meeting(&meeting_info("core", "standup-1", 0), &units, &[])
        .await
        .unwrap();

    assert!(bundle.aggregate.mean_compound > 0.05);
    assert_eq!(bundle.aggregate.negative_ratio, 0.0);
    assert!(bundle.risk.flags.is_empty());
    assert_eq!(bundle.risk.risk_level(), RiskLevel::None);
    assert!(bundle.risk.is_skipped(RiskKind::SentimentDecline));
    assert!(bundle.risk.is_skipped(RiskKind::KeywordAlert));

    let speakers: Vec<_> = bundle.speakers.iter().map(|s| s.speaker.as_str()).collect();
    assert_eq!(speakers.len(), 3);
    assert!(speakers.contains(&"Lena"));
    assert!(bundle.aggregate.participation_balance > 0.0);
}

#[tokio::test]
async fn test_tense_retro_raises_spike_and_keyword() {
    let units = transcript::parse(RETRO_TRANSCRIPT);
    assert_eq!(units.len(), 5);
    assert_eq!(units[1].speaker.as_deref(), Some("Marco"));

    let bundle = pipeline_with_keywords(&["resign", "quit"])
        .analyze_meeting(&meeting_info("core", "retro-1", 0), &units, &[])
        .await
        .unwrap();

    assert!((bundle.aggregate.negative_ratio - 0.6).abs() < 1e-9);

    let spike = bundle.risk.flag(RiskKind::NegativeSpike).unwrap();
    assert_eq!(spike.severity, Severity::Medium);
    assert_eq!(spike.evidence, ["u1", "u2", "u3"]);

    let keyword = bundle.risk.flag(RiskKind::KeywordAlert).unwrap();
    assert_eq!(keyword.severity, Severity::High);
    assert_eq!(keyword.evidence, ["u4"]);

    let ranked = bundle.risk.ranked();
    assert_eq!(ranked[0].kind, RiskKind::KeywordAlert);
    assert_eq!(bundle.risk.risk_score(), 65);
    assert_eq!(bundle.risk.risk_level(), RiskLevel::High);
}

#[tokio::test]
async fn test_seventy_percent_negative_is_high_spike() {
    let units = units(&SPIKE_LINES);
    let bundle = pipeline_with_keywords(&[])
        .analyze_meeting(&meeting_info("core", "m-spike", 0), &units, &[])
        .await
        .unwrap();

    assert!((bundle.aggregate.negative_ratio - 0.7).abs() < 1e-12);
    let spike = bundle.risk.flag(RiskKind::NegativeSpike).unwrap();
    assert_eq!(spike.severity, Severity::High);
    assert_eq!(spike.evidence.len(), 7);
}

#[tokio::test]
async fn test_keyword_alert_ignores_positive_sentiment() {
    let units = units(&["I love this team, but I will resign happily!"]);
    let bundle = pipeline_with_keywords(&["resign"])
        .analyze_meeting(&meeting_info("core", "m-kw", 0), &units, &[])
        .await
        .unwrap();

    assert!(bundle.scores[0].compound > 0.0);
    let flag = bundle.risk.flag(RiskKind::KeywordAlert).unwrap();
    assert_eq!(flag.severity, Severity::High);
}

// ============================================================================
// History and Trends
// ============================================================================

#[tokio::test]
async fn test_decline_against_history_window() {
    let history = vec![
        aggregate("w0", 0, 0.6),
        aggregate("w1", 1, 0.5),
        aggregate("w2", 2, 0.55),
    ];
    let units = transcript::parse(RETRO_TRANSCRIPT);

    let bundle = pipeline_with_keywords(&[])
        .analyze_meeting(&meeting_info("core", "w3", 3), &units, &history)
        .await
        .unwrap();

    let decline = bundle.risk.flag(RiskKind::SentimentDecline).unwrap();
    assert_eq!(decline.severity, Severity::High);
    assert!(decline.evidence[0].contains("last 3 meeting(s)"));

    let latest = bundle.latest_trend(TrendMetric::MeanCompound).unwrap();
    assert_eq!(latest.meeting_id, "w3");
    assert_eq!(latest.direction, TrendDirection::Declining);

    let compound: Vec<_> = bundle
        .trends
        .iter()
        .filter(|p| p.metric == TrendMetric::MeanCompound)
        .map(|p| p.direction)
        .collect();
    assert_eq!(
        compound,
        [
            TrendDirection::Stable,
            TrendDirection::Declining,
            TrendDirection::Improving,
            TrendDirection::Declining,
        ]
    );
}

#[tokio::test]
async fn test_reanalysis_ignores_own_history_entry() {
    let pipeline = pipeline_with_keywords(&[]);
    let units = transcript::parse(STANDUP_TRANSCRIPT);
    let meeting = meeting_info("core", "w1", 1);

    let first = pipeline.analyze_meeting(&meeting, &units, &[]).await.unwrap();
    let history = vec![aggregate("w0", 0, 0.2), first.aggregate.clone()];
    let second = pipeline
        .analyze_meeting(&meeting, &units, &history)
        .await
        .unwrap();

    assert_eq!(second.aggregate, first.aggregate);
    let points: Vec<_> = second
        .trends
        .iter()
        .filter(|p| p.metric == TrendMetric::MeanCompound)
        .collect();
    assert_eq!(points.len(), 2);
}

// ============================================================================
// Team health
// ============================================================================

#[tokio::test]
async fn test_quiet_speaker_from_history_is_disengaging() {
    let mut history = vec![aggregate("standup-0", 0, 0.3), aggregate("standup-1", 1, 0.3)];
    for entry in &mut history {
        entry.speaker_engagement.insert("Zed".to_string(), 20.0);
        entry.speaker_engagement.insert("Lena".to_string(), 60.0);
    }

    let units = transcript::parse(STANDUP_TRANSCRIPT);
    let bundle = pipeline_with_keywords(&[])
        .analyze_meeting(&meeting_info("core", "standup-2", 2), &units, &history)
        .await
        .unwrap();

    let disengagement = bundle.health.disengagement.as_ref().unwrap();
    let names: Vec<_> = disengagement
        .at_risk_speakers
        .iter()
        .map(|s| s.speaker.as_str())
        .collect();
    assert!(names.contains(&"Zed"));
    assert!(bundle.health.burnout.is_some());
    assert!(bundle.health.dominance.is_some());

    let digest = DigestRenderer::new().unwrap().render(&bundle).unwrap();
    assert!(digest.contains("## Team health"));
    assert!(digest.contains("- **disengagement**"));
    assert!(digest.contains("Zed at 20.0"));
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_bundle_renders_to_json_and_markdown() {
    let units = transcript::parse(RETRO_TRANSCRIPT);
    let bundle = pipeline_with_keywords(&["resign"])
        .analyze_meeting(&meeting_info("core", "retro-2", 0), &units, &[])
        .await
        .unwrap();

    let json = render_json(&bundle).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["meeting_id"], "retro-2");
    assert_eq!(value["risk"]["flags"].as_array().unwrap().len(), 2);

    let digest = DigestRenderer::new().unwrap().render(&bundle).unwrap();
    assert!(digest.contains("# Meeting digest: retro-2"));
    assert!(digest.contains("`KEYWORD_ALERT`: u4"));
    assert!(digest.contains("| Priya |"));
    assert!(digest.contains("Schedule 1-on-1s to address team tensions"));
}
