//! Property tests for the scorer and the trend analyzer

mod common;

use meetpulse::analytics::{SentimentScorer, TrendAnalyzer};
use meetpulse::models::TrendDirection;
use proptest::prelude::*;

fn scorer() -> &'static SentimentScorer {
    static SCORER: std::sync::OnceLock<SentimentScorer> = std::sync::OnceLock::new();
    SCORER.get_or_init(SentimentScorer::default)
}

/// Sentences mixing lexicon terms, modifiers and punctuation
fn sentence() -> impl Strategy<Value = String> {
    let words = prop::sample::select(vec![
        "good", "bad", "not", "very", "slightly", "GREAT", "terrible", "but", "the", "plan",
        "never", "happy", "broken", "really", "ok", "!", "?", "meeting", "love", "hate",
    ]);
    prop::collection::vec(words, 0..24).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn prop_proportions_sum_to_one(text in sentence()) {
        let score = scorer().score_text("u1", &text);
        let sum = score.positive + score.neutral + score.negative;
        prop_assert!((sum - 1.0).abs() < 1e-6, "sum {} for {:?}", sum, text);
        prop_assert!((-1.0..=1.0).contains(&score.compound));
        prop_assert!(score.positive >= 0.0 && score.negative >= 0.0 && score.neutral >= 0.0);
    }

    #[test]
    fn prop_arbitrary_text_is_scored(text in any::<String>()) {
        let score = scorer().score_text("u1", &text);
        let sum = score.positive + score.neutral + score.negative;
        prop_assert!((sum - 1.0).abs() < 1e-6);
        prop_assert!(score.compound.is_finite());
    }

    #[test]
    fn prop_scoring_is_deterministic(text in sentence()) {
        prop_assert_eq!(scorer().score_text("u1", &text), scorer().score_text("u1", &text));
    }

    #[test]
    fn prop_trend_is_idempotent(values in prop::collection::vec(-1.0f64..1.0, 0..12)) {
        let history: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| common::aggregate(&format!("w{i}"), i as i64, v))
            .collect();

        let analyzer = TrendAnalyzer::default();
        let first = analyzer.analyze(&history).unwrap();
        prop_assert_eq!(&first, &analyzer.analyze(&history).unwrap());
        prop_assert_eq!(first.len(), history.len());
        if let Some(point) = first.first() {
            prop_assert_eq!(point.delta_from_previous, 0.0);
            prop_assert_eq!(point.direction, TrendDirection::Stable);
        }
    }
}

#[test]
fn test_whitespace_only_is_exactly_neutral() {
    for text in ["", "   ", "\n\t "] {
        let score = scorer().score_text("u1", text);
        assert_eq!(
            (score.positive, score.neutral, score.negative, score.compound),
            (0.0, 1.0, 0.0, 0.0)
        );
    }
}

#[test]
fn test_negation_lowers_compound() {
    let good = scorer().score_text("a", "good").compound;
    let not_good = scorer().score_text("b", "not good").compound;
    assert!(not_good < good);
}

#[test]
fn test_intensifier_does_not_weaken() {
    let good = scorer().score_text("a", "good").compound;
    let very_good = scorer().score_text("b", "very good").compound;
    assert!(very_good.abs() >= good.abs());
}
