//! Batch runner integration tests
//!
//! Multiple teams sharing one history store, run concurrently

use meetpulse::analytics::Lexicon;
use meetpulse::config::Config;
use meetpulse::error::{Error, ErrorCategory, MeetpulseErrorTrait};
use meetpulse::models::RiskKind;
use meetpulse::pipeline::{
    AnalyticsPipeline, HistoryError, HistoryStore, InMemoryHistoryStore, MeetingInput,
};
use meetpulse::transcript;

use super::fixtures::{RETRO_TRANSCRIPT, STANDUP_TRANSCRIPT};
use crate::common::{aggregate, meeting_info, units};
use std::collections::HashMap;

fn input(team: &str, id: &str, week: i64, text: &str) -> MeetingInput {
    MeetingInput {
        meeting: meeting_info(team, id, week),
        units: transcript::parse(text),
    }
}

#[tokio::test]
async fn test_batch_builds_history_per_team() {
    let mut config = Config::default();
    config.pipeline.max_concurrent_teams = 2;
    let pipeline = AnalyticsPipeline::new(&config, Lexicon::default()).unwrap();
    let store = InMemoryHistoryStore::new();

    // submitted out of order on purpose
    let meetings = vec![
        input("core", "core-2", 1, RETRO_TRANSCRIPT),
        input("infra", "infra-1", 0, RETRO_TRANSCRIPT),
        input("core", "core-1", 0, STANDUP_TRANSCRIPT),
        input("infra", "infra-2", 1, STANDUP_TRANSCRIPT),
    ];

    let report = pipeline.run_batch(meetings, &store).await;
    assert_eq!(report.succeeded(), 4);

    let core = store.load("core").await.unwrap();
    let ids: Vec<_> = core.iter().map(|a| a.meeting_id.as_str()).collect();
    assert_eq!(ids, ["core-1", "core-2"]);

    // core-2 ran after core-1 and saw it as history
    let core_2 = report.bundles().find(|b| b.meeting_id == "core-2").unwrap();
    assert!(core_2.risk.flag(RiskKind::SentimentDecline).is_some());

    // infra-2 improved on infra-1
    let infra_2 = report.bundles().find(|b| b.meeting_id == "infra-2").unwrap();
    assert!(infra_2.risk.flag(RiskKind::SentimentDecline).is_none());
    assert!(!infra_2.risk.is_skipped(RiskKind::SentimentDecline));
}

#[tokio::test]
async fn test_batch_isolates_invalid_meeting() {
    let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default()).unwrap();
    let store = InMemoryHistoryStore::new();

    let mut duplicate = MeetingInput {
        meeting: meeting_info("core", "bad", 1),
        units: units(&["One.", "Two."]),
    };
    duplicate.units[1].id = "u1".to_string();

    let meetings = vec![
        input("core", "good-1", 0, STANDUP_TRANSCRIPT),
        duplicate,
        input("core", "good-2", 2, STANDUP_TRANSCRIPT),
    ];

    let report = pipeline.run_batch(meetings, &store).await;
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let (outcome, err) = report.failures().next().unwrap();
    assert_eq!(outcome.meeting_id, "bad");
    assert!(matches!(err, Error::Aggregate(_)));
    assert!(!err.is_recoverable());

    assert_eq!(store.load("core").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rerun_replaces_stored_aggregate() {
    let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default()).unwrap();
    let store = InMemoryHistoryStore::new();

    for text in [RETRO_TRANSCRIPT, STANDUP_TRANSCRIPT] {
        let report = pipeline
            .run_batch(vec![input("core", "weekly", 0, text)], &store)
            .await;
        assert_eq!(report.succeeded(), 1);
    }

    let history = store.load("core").await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].mean_compound > 0.0);
}

#[tokio::test]
async fn test_timestamp_collision_fails_only_the_colliding_meeting() {
    let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default()).unwrap();
    let store = InMemoryHistoryStore::new();

    let meetings = vec![
        input("core", "a", 0, STANDUP_TRANSCRIPT),
        input("core", "b", 0, RETRO_TRANSCRIPT),
        input("core", "c", 1, STANDUP_TRANSCRIPT),
        input("core", "d", 2, RETRO_TRANSCRIPT),
    ];

    let report = pipeline.run_batch(meetings, &store).await;
    let results: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| (o.meeting_id.as_str(), o.result.is_ok()))
        .collect();
    assert_eq!(results, [("a", true), ("b", false), ("c", true), ("d", true)]);

    let (_, err) = report.failures().next().unwrap();
    assert!(matches!(
        err,
        Error::History(HistoryError::TimestampCollision { existing, .. }) if existing == "a"
    ));
    assert_eq!(err.category(), ErrorCategory::Validation);

    let history = store.load("core").await.unwrap();
    let ids: Vec<_> = history.iter().map(|a| a.meeting_id.as_str()).collect();
    assert_eq!(ids, ["a", "c", "d"]);
}

#[tokio::test]
async fn test_reanalysis_between_stored_meetings_keeps_history_usable() {
    let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default()).unwrap();
    let mut teams = HashMap::new();
    teams.insert(
        "core".to_string(),
        vec![
            aggregate("w0", 0, 0.4),
            aggregate("w1", 1, 0.4),
            aggregate("w2", 2, 0.4),
        ],
    );
    let store = InMemoryHistoryStore::with_history(teams).unwrap();

    // w1 sits between two stored meetings and is replaced in place
    let report = pipeline
        .run_batch(vec![input("core", "w1", 1, RETRO_TRANSCRIPT)], &store)
        .await;
    assert_eq!(report.succeeded(), 1);
    let w1 = report.bundles().next().unwrap();
    let compound_ids: Vec<_> = w1
        .trends
        .iter()
        .filter(|p| p.metric == meetpulse::models::TrendMetric::MeanCompound)
        .map(|p| p.meeting_id.as_str())
        .collect();
    assert_eq!(compound_ids, ["w0", "w1"]);

    let report = pipeline
        .run_batch(vec![input("core", "w3", 3, STANDUP_TRANSCRIPT)], &store)
        .await;
    assert_eq!(report.succeeded(), 1);

    let history = store.load("core").await.unwrap();
    let ids: Vec<_> = history.iter().map(|a| a.meeting_id.as_str()).collect();
    assert_eq!(ids, ["w0", "w1", "w2", "w3"]);
    assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(history[1].mean_compound < 0.4);
}
