// Core data structures for meeting analytics

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Smallest scored span of a transcript, usually one speaker turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Unique within the meeting
    pub id: String,
    pub text: String,
    pub speaker: Option<String>,
    /// Clock offset inside the meeting, when the transcript carried one
    pub timestamp: Option<NaiveTime>,
}

impl TextUnit {
    /// Create a unit without speaker or timestamp
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            speaker: None,
            timestamp: None,
        }
    }

    /// Attach a speaker name
    #[must_use]
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }
}

/// Polarity vector for one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub unit_id: String,
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    /// Normalized composite in [-1, 1]
    pub compound: f64,
}

impl SentimentScore {
    /// Fully neutral score: {0, 1, 0, 0.0}
    pub fn neutral(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            positive: 0.0,
            neutral: 1.0,
            negative: 0.0,
            compound: 0.0,
        }
    }

    /// Label derived from the compound score
    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

/// Coarse sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Classify a compound score using a ±0.05 neutral band
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            Self::Positive
        } else if compound <= -0.05 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Identifying data for one meeting, supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub meeting_id: String,
    /// Team or channel whose history this meeting belongs to
    pub team_id: String,
    pub timestamp: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
}

/// Per-meeting rollup of unit scores
///
/// Derived data: a recomputation produces a new value that replaces the
/// previous one, it is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingAggregate {
    pub meeting_id: String,
    pub timestamp: DateTime<Utc>,
    pub mean_compound: f64,
    /// Fraction of units whose negative component exceeds the unit threshold
    pub negative_ratio: f64,
    pub unit_count: usize,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub word_count: usize,
    /// 1.0 is perfectly balanced, 0.0 is a single voice
    #[serde(default = "default_balance")]
    pub participation_balance: f64,
    /// Mean speaker engagement score, 0 without speaker attribution
    #[serde(default)]
    pub mean_engagement: f64,
    /// Engagement score per attributed speaker
    #[serde(default)]
    pub speaker_engagement: BTreeMap<String, f64>,
}

fn default_balance() -> f64 {
    1.0
}

/// Per-speaker metrics within one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMetrics {
    pub speaker: String,
    pub unit_count: usize,
    pub word_count: usize,
    pub participation_pct: f64,
    pub avg_words_per_unit: f64,
    pub avg_compound: f64,
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    pub question_count: usize,
    /// Composite involvement score, 0-100
    pub engagement_score: f64,
}

/// Kind of risk raised by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskKind {
    NegativeSpike,
    LowEngagement,
    SentimentDecline,
    KeywordAlert,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegativeSpike => "NEGATIVE_SPIKE",
            Self::LowEngagement => "LOW_ENGAGEMENT",
            Self::SentimentDecline => "SENTIMENT_DECLINE",
            Self::KeywordAlert => "KEYWORD_ALERT",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::NegativeSpike,
            Self::LowEngagement,
            Self::SentimentDecline,
            Self::KeywordAlert,
        ]
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal risk intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Grade how far a value overshoots its threshold
    ///
    /// - `ratio < 1.5`: Low
    /// - `1.5 <= ratio < 2.0`: Medium
    /// - `ratio >= 2.0`: High
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 2.0 {
            Self::High
        } else if ratio >= 1.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Weight used by the composite risk score
    pub fn weight(&self) -> u32 {
        match self {
            Self::Low => 10,
            Self::Medium => 25,
            Self::High => 40,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raised risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub meeting_id: String,
    pub kind: RiskKind,
    pub severity: Severity,
    /// Unit ids, or a short excerpt when no unit applies
    pub evidence: Vec<String>,
}

/// A rule that could not be evaluated for lack of data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub kind: RiskKind,
    pub reason: String,
}

/// Overall level derived from the composite risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Level for a 0-100 score given the medium and high cut-offs
    #[must_use]
    pub fn from_score(score: u32, medium: u32, high: u32) -> Self {
        match score {
            s if s >= high => Self::High,
            s if s >= medium => Self::Medium,
            0 => Self::None,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Result of one detector run for one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub meeting_id: String,
    /// At most one flag per kind, in no required order
    pub flags: Vec<RiskFlag>,
    pub skipped_rules: Vec<SkippedRule>,
}

impl RiskReport {
    /// Flags sorted by severity (highest first), then by kind name
    pub fn ranked(&self) -> Vec<RiskFlag> {
        let mut flags = self.flags.clone();
        flags.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });
        flags
    }

    /// Find the flag raised for a kind
    pub fn flag(&self, kind: RiskKind) -> Option<&RiskFlag> {
        self.flags.iter().find(|f| f.kind == kind)
    }

    /// Check whether a rule was skipped
    pub fn is_skipped(&self, kind: RiskKind) -> bool {
        self.skipped_rules.iter().any(|s| s.kind == kind)
    }

    /// Composite score: sum of severity weights, capped at 100
    pub fn risk_score(&self) -> u32 {
        self.flags
            .iter()
            .map(|f| f.severity.weight())
            .sum::<u32>()
            .min(100)
    }

    /// Level for the composite score
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score(), 30, 50)
    }

    /// Suggested follow-up for the composite level
    pub fn recommendation(&self) -> &'static str {
        match self.risk_level() {
            RiskLevel::High => {
                "Schedule 1-on-1s to address team tensions. Consider conflict resolution facilitation."
            }
            RiskLevel::Medium => "Monitor closely. Consider team retrospective to surface concerns.",
            RiskLevel::Low => "Minor concerns detected. Keep monitoring trends.",
            RiskLevel::None => "No conflict risks detected. Team communication appears healthy.",
        }
    }
}

/// Metric tracked across meetings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    MeanCompound,
    NegativeRatio,
    UnitCount,
    ParticipationBalance,
    Engagement,
}

impl TrendMetric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MeanCompound => "mean_compound",
            Self::NegativeRatio => "negative_ratio",
            Self::UnitCount => "unit_count",
            Self::ParticipationBalance => "participation_balance",
            Self::Engagement => "engagement",
        }
    }

    /// Parse a metric name
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|m| m.name() == s)
    }

    pub fn all() -> [Self; 5] {
        [
            Self::MeanCompound,
            Self::NegativeRatio,
            Self::UnitCount,
            Self::ParticipationBalance,
            Self::Engagement,
        ]
    }

    /// Whether a rising value counts as an improvement
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Self::NegativeRatio)
    }

    /// Read this metric from an aggregate
    pub fn value(&self, aggregate: &MeetingAggregate) -> f64 {
        match self {
            Self::MeanCompound => aggregate.mean_compound,
            Self::NegativeRatio => aggregate.negative_ratio,
            Self::UnitCount => aggregate.unit_count as f64,
            Self::ParticipationBalance => aggregate.participation_balance,
            Self::Engagement => aggregate.mean_engagement,
        }
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of change between consecutive meetings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl TrendDirection {
    /// Classify a change that is already oriented so positive means better
    #[must_use]
    pub fn from_change(change: f64, tolerance: f64) -> Self {
        if change > tolerance {
            Self::Improving
        } else if change < -tolerance {
            Self::Declining
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "IMPROVING",
            Self::Stable => "STABLE",
            Self::Declining => "DECLINING",
        }
    }
}

/// Per-meeting metric value plus its change from the prior meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub meeting_id: String,
    pub metric: TrendMetric,
    pub value: f64,
    pub delta_from_previous: f64,
    pub direction: TrendDirection,
}

/// Outcome of one team-health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub level: RiskLevel,
    /// 0-100
    pub score: u32,
    /// Human-readable reasons behind the score
    pub indicators: Vec<String>,
    pub recommendation: String,
}

/// Speaker whose engagement fell over the last few meetings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskSpeaker {
    pub speaker: String,
    pub current_engagement: f64,
    /// Negative when engagement fell
    pub decline_percentage: f64,
}

/// Speaker-level disengagement over the recent meetings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisengagementCheck {
    pub level: RiskLevel,
    pub at_risk_speakers: Vec<AtRiskSpeaker>,
    pub recommendation: String,
}

/// Team-health checks reported next to the risk flags
///
/// `None` means the check had too little data to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamHealth {
    pub dominance: Option<DominanceCheck>,
    pub burnout: Option<HealthCheck>,
    pub disengagement: Option<DisengagementCheck>,
}

/// Participation dominance within one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominanceCheck {
    #[serde(flatten)]
    pub check: HealthCheck,
    /// Speakers holding an outsized share of the conversation
    pub dominant_speakers: Vec<String>,
}

/// Everything computed for one meeting, handed to report rendering and
/// notification collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsBundle {
    pub meeting_id: String,
    /// SHA-256 of the lexicon that produced the scores
    pub lexicon_fingerprint: String,
    pub aggregate: MeetingAggregate,
    pub speakers: Vec<SpeakerMetrics>,
    pub scores: Vec<SentimentScore>,
    pub risk: RiskReport,
    /// Trend points over prior history plus this meeting, grouped by metric
    pub trends: Vec<TrendPoint>,
    #[serde(default)]
    pub health: TeamHealth,
}

impl AnalyticsBundle {
    /// Latest trend point recorded for a metric
    pub fn latest_trend(&self, metric: TrendMetric) -> Option<&TrendPoint> {
        self.trends.iter().rev().find(|p| p.metric == metric)
    }
}
