//! Per-meeting orchestration
//!
//! Wires the analytics stages together:
//!
//! ```text
//! units ──▶ score (fan-out) ──▶ join ──▶ aggregate ──┬─▶ risk
//!                                                    ├─▶ trends (prior history + this meeting)
//!                                                    └─▶ team health
//! ```
//!
//! Scoring is CPU-bound and runs on the blocking pool; everything after the
//! join is cheap and synchronous.

pub mod batch;
pub mod history;

pub use batch::{BatchReport, MeetingInput, MeetingOutcome};
pub use history::{HistoryError, HistoryStore, InMemoryHistoryStore};

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::analytics::{
    speaker_metrics, Aggregator, HealthAnalyzer, Lexicon, RiskDetector, SentimentScorer,
    TrendAnalyzer,
};
use crate::config::{Config, PipelineConfig};
use crate::error::{Error, Result};
use crate::models::{
    AnalyticsBundle, MeetingAggregate, MeetingInfo, SentimentScore, TextUnit, TrendMetric,
};

/// Sentiment → risk → trend pipeline bound to one configuration
#[derive(Debug, Clone)]
pub struct AnalyticsPipeline {
    scorer: Arc<SentimentScorer>,
    aggregator: Aggregator,
    detector: RiskDetector,
    trends: TrendAnalyzer,
    health: HealthAnalyzer,
    settings: PipelineConfig,
}

impl AnalyticsPipeline {
    /// Build the pipeline
    ///
    /// Configuration is validated here so that a bad threshold fails before
    /// any meeting is processed.
    pub fn new(config: &Config, lexicon: Lexicon) -> Result<Self> {
        config.validate()?;
        let thresholds = config.thresholds.build()?;

        Ok(Self {
            scorer: Arc::new(SentimentScorer::new(lexicon)),
            aggregator: Aggregator::new(&thresholds),
            trends: TrendAnalyzer::from_thresholds(&thresholds),
            health: HealthAnalyzer::new(TrendAnalyzer::from_thresholds(&thresholds)),
            detector: RiskDetector::new(thresholds),
            settings: config.pipeline.clone(),
        })
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    /// Score units on the current thread
    pub fn score_units(&self, units: &[TextUnit]) -> Vec<SentimentScore> {
        units.iter().map(|unit| self.scorer.score(unit)).collect()
    }

    /// Score units on the blocking pool, at most `max_concurrent` at a time
    ///
    /// Results come back in input order.
    pub async fn score_concurrent(&self, units: &[TextUnit]) -> Result<Vec<SentimentScore>> {
        let results: Vec<_> = stream::iter(units.iter().cloned())
            .map(|unit| {
                let scorer = Arc::clone(&self.scorer);
                tokio::task::spawn_blocking(move || scorer.score(&unit))
            })
            .buffered(self.settings.max_concurrent)
            .collect()
            .await;

        results
            .into_iter()
            .map(|joined| joined.map_err(|e| Error::with_source("Scoring task failed", e)))
            .collect()
    }

    /// Full analysis of one meeting, scoring on the current thread
    ///
    /// `history` is the team's stored history. Entries at or after the
    /// meeting, and any earlier record of the same meeting, are ignored. A
    /// different meeting stored at the same timestamp is rejected.
    pub fn analyze_units(
        &self,
        meeting: &MeetingInfo,
        units: &[TextUnit],
        history: &[MeetingAggregate],
    ) -> Result<AnalyticsBundle> {
        let scores = self.score_units(units);
        self.assemble(meeting, units, scores, history)
    }

    /// Same as [`Self::analyze_units`] with concurrent scoring
    pub async fn analyze_meeting(
        &self,
        meeting: &MeetingInfo,
        units: &[TextUnit],
        history: &[MeetingAggregate],
    ) -> Result<AnalyticsBundle> {
        let scores = self.score_concurrent(units).await?;
        self.assemble(meeting, units, scores, history)
    }

    fn assemble(
        &self,
        meeting: &MeetingInfo,
        units: &[TextUnit],
        scores: Vec<SentimentScore>,
        history: &[MeetingAggregate],
    ) -> Result<AnalyticsBundle> {
        history::check_collision(history, &meeting.meeting_id, meeting.timestamp)?;
        let prior = prior_history(meeting, history);

        let aggregate = self.aggregator.aggregate(meeting, units, &scores)?;
        let speakers = speaker_metrics(units, &scores)?;
        let risk = self.detector.detect(&aggregate, units, &scores, &prior)?;

        let mut series = prior;
        series.push(aggregate.clone());
        let trends = self.trends.analyze_all(&series, &TrendMetric::all())?;
        let health = self.health.analyze(&speakers, &series)?;

        tracing::debug!(
            meeting_id = %meeting.meeting_id,
            team_id = %meeting.team_id,
            units = aggregate.unit_count,
            mean_compound = aggregate.mean_compound,
            flags = risk.flags.len(),
            history = series.len() - 1,
            "Meeting analyzed"
        );

        Ok(AnalyticsBundle {
            meeting_id: meeting.meeting_id.clone(),
            lexicon_fingerprint: self.scorer.fingerprint().to_string(),
            aggregate,
            speakers,
            scores,
            risk,
            trends,
            health,
        })
    }
}

/// Stored entries strictly before the meeting, excluding the meeting itself
fn prior_history(meeting: &MeetingInfo, history: &[MeetingAggregate]) -> Vec<MeetingAggregate> {
    history
        .iter()
        .filter(|a| a.timestamp < meeting.timestamp && a.meeting_id != meeting.meeting_id)
        .cloned()
        .collect()
}
