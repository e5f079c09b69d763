//! Per-meeting rollup of unit scores
//!
//! Produces the [`MeetingAggregate`] consumed by risk detection and trend
//! analysis, plus per-speaker participation metrics.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::config::Thresholds;
use crate::models::{
    MeetingAggregate, MeetingInfo, SentimentLabel, SentimentScore, SpeakerMetrics, TextUnit,
};
use crate::utils::{round_to, word_count};

/// Words that open a question when they start a unit
const QUESTION_OPENERS: &[&str] = &[
    "who", "what", "where", "when", "why", "how", "is", "are", "can", "could", "would",
    "should", "do", "does", "did",
];

/// Mismatches between a meeting's units and its scores
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Duplicate unit id: {0}")]
    DuplicateUnit(String),

    #[error("Score references unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unit {0} has no score")]
    MissingScore(String),

    #[error("Unit {0} was scored more than once")]
    DuplicateScore(String),
}

/// Map each unit id to its score, checking the two sets line up exactly
pub fn index_scores<'a>(
    units: &[TextUnit],
    scores: &'a [SentimentScore],
) -> Result<HashMap<&'a str, &'a SentimentScore>, AggregateError> {
    let mut ids = HashSet::with_capacity(units.len());
    for unit in units {
        if !ids.insert(unit.id.as_str()) {
            return Err(AggregateError::DuplicateUnit(unit.id.clone()));
        }
    }

    let mut by_unit = HashMap::with_capacity(scores.len());
    for score in scores {
        if !ids.contains(score.unit_id.as_str()) {
            return Err(AggregateError::UnknownUnit(score.unit_id.clone()));
        }
        if by_unit.insert(score.unit_id.as_str(), score).is_some() {
            return Err(AggregateError::DuplicateScore(score.unit_id.clone()));
        }
    }

    if let Some(unit) = units.iter().find(|u| !by_unit.contains_key(u.id.as_str())) {
        return Err(AggregateError::MissingScore(unit.id.clone()));
    }

    Ok(by_unit)
}

/// Builds meeting aggregates from scored units
#[derive(Debug, Clone)]
pub struct Aggregator {
    negative_unit_threshold: f64,
}

impl Aggregator {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            negative_unit_threshold: thresholds.negative_unit_threshold(),
        }
    }

    /// Roll up one meeting
    ///
    /// Every unit must have exactly one score. A meeting without units
    /// aggregates to a neutral, perfectly balanced rollup.
    pub fn aggregate(
        &self,
        meeting: &MeetingInfo,
        units: &[TextUnit],
        scores: &[SentimentScore],
    ) -> Result<MeetingAggregate, AggregateError> {
        index_scores(units, scores)?;
        let speakers = speaker_metrics(units, scores)?;

        let unit_count = units.len();
        let (mean_compound, negative_ratio) = if unit_count == 0 {
            (0.0, 0.0)
        } else {
            let n = unit_count as f64;
            let mean = scores.iter().map(|s| s.compound).sum::<f64>() / n;
            let negative = negative_units(scores, self.negative_unit_threshold).len();
            (mean, negative as f64 / n)
        };

        Ok(MeetingAggregate {
            meeting_id: meeting.meeting_id.clone(),
            timestamp: meeting.timestamp,
            mean_compound,
            negative_ratio,
            unit_count,
            duration_minutes: meeting.duration_minutes,
            word_count: units.iter().map(|u| word_count(&u.text)).sum(),
            participation_balance: participation_balance(&speakers),
            mean_engagement: mean_engagement(&speakers),
            speaker_engagement: speakers
                .iter()
                .map(|s| (s.speaker.clone(), s.engagement_score))
                .collect(),
        })
    }
}

/// Ids of units whose negative share exceeds `threshold`, in score order
pub fn negative_units(scores: &[SentimentScore], threshold: f64) -> Vec<&str> {
    scores
        .iter()
        .filter(|s| s.negative > threshold)
        .map(|s| s.unit_id.as_str())
        .collect()
}

/// Per-speaker metrics, most active speaker first
///
/// Units without a speaker are left out, and participation percentages are
/// relative to attributed units only.
pub fn speaker_metrics(
    units: &[TextUnit],
    scores: &[SentimentScore],
) -> Result<Vec<SpeakerMetrics>, AggregateError> {
    let by_unit = index_scores(units, scores)?;

    let mut grouped: BTreeMap<&str, Vec<(&TextUnit, &SentimentScore)>> = BTreeMap::new();
    for unit in units {
        if let Some(speaker) = unit.speaker.as_deref() {
            grouped
                .entry(speaker)
                .or_default()
                .push((unit, by_unit[unit.id.as_str()]));
        }
    }

    let attributed: usize = grouped.values().map(Vec::len).sum();

    let mut metrics: Vec<SpeakerMetrics> = grouped
        .into_iter()
        .map(|(speaker, turns)| {
            let unit_count = turns.len();
            let words: usize = turns.iter().map(|(u, _)| word_count(&u.text)).sum();
            let participation_pct = unit_count as f64 / attributed as f64 * 100.0;
            let avg_words_per_unit = words as f64 / unit_count as f64;
            let avg_compound =
                turns.iter().map(|(_, s)| s.compound).sum::<f64>() / unit_count as f64;

            let count_label =
                |label: SentimentLabel| turns.iter().filter(|(_, s)| s.label() == label).count();
            let question_count = turns.iter().filter(|(u, _)| is_question(&u.text)).count();

            SpeakerMetrics {
                speaker: speaker.to_string(),
                unit_count,
                word_count: words,
                participation_pct,
                avg_words_per_unit,
                avg_compound,
                positive_count: count_label(SentimentLabel::Positive),
                neutral_count: count_label(SentimentLabel::Neutral),
                negative_count: count_label(SentimentLabel::Negative),
                question_count,
                engagement_score: engagement_score(
                    avg_words_per_unit,
                    question_count,
                    unit_count,
                    participation_pct,
                ),
            }
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.participation_pct
            .total_cmp(&a.participation_pct)
            .then_with(|| a.speaker.cmp(&b.speaker))
    });

    Ok(metrics)
}

/// Whether a unit reads as a question
pub fn is_question(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    crate::utils::tokenize(text)
        .first()
        .is_some_and(|w| QUESTION_OPENERS.contains(&w.to_lowercase().as_str()))
}

/// Composite involvement score in `[0, 100]`
///
/// 40% message length (20 words saturates), 30% question rate,
/// 30% share of the conversation.
pub fn engagement_score(
    avg_words: f64,
    questions: usize,
    units: usize,
    participation_pct: f64,
) -> f64 {
    let word_score = (avg_words / 20.0 * 100.0).min(100.0);
    let question_score = if units > 0 {
        (questions as f64 / units as f64 * 100.0).min(100.0)
    } else {
        0.0
    };
    let participation_score = participation_pct.min(100.0);

    round_to(
        word_score * 0.4 + question_score * 0.3 + participation_score * 0.3,
        2,
    )
}

/// Average speaker engagement, 0 when no unit is attributed
pub fn mean_engagement(speakers: &[SpeakerMetrics]) -> f64 {
    if speakers.is_empty() {
        return 0.0;
    }
    let total: f64 = speakers.iter().map(|s| s.engagement_score).sum();
    round_to(total / speakers.len() as f64, 2)
}

/// `1 - normalized Gini` over speaker participation
///
/// 1.0 means every speaker talked equally, 0.0 means one speaker did all the
/// talking. With zero or one speaker the meeting is trivially balanced.
pub fn participation_balance(speakers: &[SpeakerMetrics]) -> f64 {
    let n = speakers.len();
    if n <= 1 {
        return 1.0;
    }

    let mut shares: Vec<f64> = speakers.iter().map(|s| s.participation_pct).collect();
    shares.sort_by(f64::total_cmp);

    let total: f64 = shares.iter().sum();
    if total <= 0.0 {
        return 1.0;
    }

    let n_f64 = n as f64;
    let weighted: f64 = shares
        .iter()
        .enumerate()
        .map(|(i, share)| (n_f64 - i as f64) * share)
        .sum();
    let gini = (n_f64 + 1.0) / n_f64 - 2.0 * weighted / (n_f64 * total);
    let normalized = gini * n_f64 / (n_f64 - 1.0);

    (1.0 - normalized).clamp(0.0, 1.0)
}
