//! Team-health checks reported alongside the risk flags
//!
//! | Check | Looks at | Needs |
//! |-------|----------|-------|
//! | dominance | speaker shares in the current meeting | 2 speakers |
//! | burnout | half-over-half trends of the series | 3 meetings |
//! | disengagement | per-speaker engagement over the last 3 meetings | 3 meetings |
//!
//! A check without enough data is left out of [`TeamHealth`] instead of
//! reporting a misleading "none".

use std::collections::BTreeMap;

use crate::analytics::trend::{TrendAnalyzer, TrendResult};
use crate::models::{
    AtRiskSpeaker, DisengagementCheck, DominanceCheck, HealthCheck, MeetingAggregate, RiskLevel,
    SpeakerMetrics, TeamHealth, TrendDirection, TrendMetric,
};
use crate::utils::round_to;

/// Meetings a series needs before trend-based checks run
pub const MIN_HEALTH_MEETINGS: usize = 3;

const TOP_SPEAKER_HIGH_PCT: f64 = 50.0;
const TOP_SPEAKER_PCT: f64 = 40.0;
const TOP_TWO_PCT: f64 = 75.0;
const BALANCE_FLOOR: f64 = 0.5;

const ENGAGEMENT_DECLINE_PCT: f64 = -20.0;
const VOLUME_DECLINE_PCT: f64 = -20.0;
const LOW_ENGAGEMENT: f64 = 40.0;

const SPEAKER_DECLINE_PCT: f64 = -25.0;
const SPEAKER_LOW_ENGAGEMENT: f64 = 35.0;

/// Runs the team-health checks for one meeting
#[derive(Debug, Clone, Default)]
pub struct HealthAnalyzer {
    trends: TrendAnalyzer,
}

impl HealthAnalyzer {
    pub fn new(trends: TrendAnalyzer) -> Self {
        Self { trends }
    }

    /// Run every check
    ///
    /// `speakers` belong to the current meeting; `series` is the prior
    /// history followed by the current aggregate, oldest first.
    pub fn analyze(
        &self,
        speakers: &[SpeakerMetrics],
        series: &[MeetingAggregate],
    ) -> TrendResult<TeamHealth> {
        Ok(TeamHealth {
            dominance: dominance(speakers, series.last()),
            burnout: self.burnout(series)?,
            disengagement: disengagement(series),
        })
    }

    /// Fatigue signals from falling engagement, volume and sentiment
    pub fn burnout(&self, series: &[MeetingAggregate]) -> TrendResult<Option<HealthCheck>> {
        if series.len() < MIN_HEALTH_MEETINGS {
            return Ok(None);
        }

        let mut score = 0;
        let mut indicators = Vec::new();

        // meetings without speaker attribution carry no engagement
        let attributed: Vec<MeetingAggregate> = series
            .iter()
            .filter(|a| !a.speaker_engagement.is_empty())
            .cloned()
            .collect();
        if let Some(engagement) = self.trends.summarize(&attributed, TrendMetric::Engagement)? {
            if engagement.direction == TrendDirection::Declining
                && engagement.change_percentage < ENGAGEMENT_DECLINE_PCT
            {
                indicators.push(format!(
                    "Engagement dropped {:.1}%",
                    engagement.change_percentage.abs()
                ));
                score += 35;
            }
            if engagement.current_avg < LOW_ENGAGEMENT {
                indicators.push(format!(
                    "Low team engagement ({:.1}/100)",
                    engagement.current_avg
                ));
                score += 20;
            }
        }

        if let Some(volume) = self.trends.summarize(series, TrendMetric::UnitCount)? {
            if volume.direction == TrendDirection::Declining
                && volume.change_percentage < VOLUME_DECLINE_PCT
            {
                indicators.push(format!(
                    "Communication volume down {:.1}%",
                    volume.change_percentage.abs()
                ));
                score += 25;
            }
        }

        if let Some(sentiment) = self.trends.summarize(series, TrendMetric::MeanCompound)? {
            if sentiment.direction == TrendDirection::Declining {
                indicators.push("Team sentiment declining".to_string());
                score += 20;
            }
        }

        let level = RiskLevel::from_score(score, 35, 60);
        let recommendation = match level {
            RiskLevel::High => {
                "Team showing burnout signs. Consider workload reduction and wellness check-ins."
            }
            RiskLevel::Medium => {
                "Watch for burnout. Consider lighter meeting schedule and workload assessment."
            }
            RiskLevel::Low => "Some fatigue indicators. Monitor team energy levels.",
            RiskLevel::None => "No burnout risks detected. Team engagement appears healthy.",
        };

        Ok(Some(HealthCheck {
            level,
            score,
            indicators,
            recommendation: recommendation.to_string(),
        }))
    }
}

/// Whether one or two voices carry the current meeting
///
/// `speakers` must be sorted by participation, highest first, as
/// [`crate::analytics::speaker_metrics`] returns them.
pub fn dominance(
    speakers: &[SpeakerMetrics],
    current: Option<&MeetingAggregate>,
) -> Option<DominanceCheck> {
    let [top, second, ..] = speakers else {
        return None;
    };

    let mut score = 0;
    let mut indicators = Vec::new();
    let mut dominant_speakers = Vec::new();

    if top.participation_pct > TOP_SPEAKER_HIGH_PCT {
        indicators.push(format!(
            "{} speaks {:.1}% of the time",
            top.speaker, top.participation_pct
        ));
        dominant_speakers.push(top.speaker.clone());
        score += 40;
    } else if top.participation_pct > TOP_SPEAKER_PCT {
        indicators.push(format!(
            "{} dominates conversation ({:.1}%)",
            top.speaker, top.participation_pct
        ));
        dominant_speakers.push(top.speaker.clone());
        score += 25;
    }

    let top_two = top.participation_pct + second.participation_pct;
    if top_two > TOP_TWO_PCT {
        indicators.push(format!("Top 2 speakers control {top_two:.1}% of conversation"));
        score += 20;
    }

    if let Some(balance) = current
        .map(|a| a.participation_balance)
        .filter(|&b| b < BALANCE_FLOOR)
    {
        indicators.push(format!("Very unbalanced participation (score: {balance:.2})"));
        score += 15;
    }

    let level = RiskLevel::from_score(score, 30, 50);
    let recommendation = match level {
        RiskLevel::High => {
            "Conversation dominated by few people. Actively solicit input from quieter members."
        }
        RiskLevel::Medium => "Consider round-robin speaking order or explicit turn-taking.",
        RiskLevel::Low => "Minor imbalance detected. Encourage broader participation.",
        RiskLevel::None => "Participation appears balanced across team members.",
    };

    Some(DominanceCheck {
        check: HealthCheck {
            level,
            score,
            indicators,
            recommendation: recommendation.to_string(),
        },
        dominant_speakers,
    })
}

/// Speakers whose engagement fell across the last three meetings
///
/// Only speakers seen in at least two of those meetings are judged.
pub fn disengagement(series: &[MeetingAggregate]) -> Option<DisengagementCheck> {
    if series.len() < MIN_HEALTH_MEETINGS {
        return None;
    }

    let mut by_speaker: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for aggregate in &series[series.len() - MIN_HEALTH_MEETINGS..] {
        for (speaker, &engagement) in &aggregate.speaker_engagement {
            by_speaker
                .entry(speaker.as_str())
                .or_default()
                .push(engagement);
        }
    }

    let at_risk_speakers: Vec<AtRiskSpeaker> = by_speaker
        .into_iter()
        .filter(|(_, scores)| scores.len() >= 2)
        .filter_map(|(speaker, scores)| {
            let mid = scores.len() / 2;
            let earlier = mean(&scores[..mid]);
            let recent = mean(&scores[mid..]);
            let decline = (recent - earlier) / (earlier + 0.001) * 100.0;

            (decline < SPEAKER_DECLINE_PCT || recent < SPEAKER_LOW_ENGAGEMENT).then(|| {
                AtRiskSpeaker {
                    speaker: speaker.to_string(),
                    current_engagement: round_to(recent, 1),
                    decline_percentage: round_to(decline, 1),
                }
            })
        })
        .collect();

    let (level, recommendation) = match at_risk_speakers.as_slice() {
        [] => (
            RiskLevel::None,
            "All team members appear engaged.".to_string(),
        ),
        [only] => (
            RiskLevel::Medium,
            format!("{} may be disengaging. Consider a check-in.", only.speaker),
        ),
        _ => (
            RiskLevel::High,
            "Multiple team members showing disengagement. Schedule 1-on-1 check-ins.".to_string(),
        ),
    };

    Some(DisengagementCheck {
        level,
        at_risk_speakers,
        recommendation,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
