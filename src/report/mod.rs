//! Analytics bundle rendering
//!
//! Produces plain-text artifacts from an [`AnalyticsBundle`]: a pretty JSON
//! document and a Markdown digest rendered with Handlebars. Delivery and
//! binary formats belong to the caller.

use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{AnalyticsBundle, TeamHealth, TrendMetric};
use crate::utils::{round_to, truncate_text};

/// Default digest template
const DEFAULT_TEMPLATE: &str = include_str!("../../templates/digest.hbs");

const TEMPLATE_NAME: &str = "digest";

/// Evidence entries listed per flag before eliding the rest
const MAX_EVIDENCE: usize = 8;

/// Errors raised while rendering reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid digest template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Failed to render digest: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Failed to encode bundle: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render a bundle as pretty-printed JSON
pub fn render_json(bundle: &AnalyticsBundle) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

#[derive(Debug, Serialize)]
struct DigestData {
    meeting_id: String,
    date: String,
    duration: String,
    unit_count: usize,
    word_count: usize,
    lexicon: String,
    mean_compound: String,
    sentiment_label: &'static str,
    negative_ratio: String,
    participation_balance: String,
    risk_level: &'static str,
    risk_score: u32,
    recommendation: &'static str,
    flags: Vec<FlagRow>,
    skipped: Vec<SkippedRow>,
    trends: Vec<TrendRow>,
    speakers: Vec<SpeakerRow>,
    health: Vec<HealthRow>,
}

#[derive(Debug, Serialize)]
struct FlagRow {
    severity: &'static str,
    kind: &'static str,
    evidence: String,
}

#[derive(Debug, Serialize)]
struct SkippedRow {
    kind: &'static str,
    reason: String,
}

#[derive(Debug, Serialize)]
struct TrendRow {
    metric: &'static str,
    value: String,
    delta: String,
    direction: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthRow {
    check: &'static str,
    level: &'static str,
    score: Option<u32>,
    details: String,
    recommendation: String,
}

#[derive(Debug, Serialize)]
struct SpeakerRow {
    name: String,
    share: String,
    units: usize,
    words: usize,
    avg_compound: String,
    questions: usize,
    engagement: String,
}

impl From<&AnalyticsBundle> for DigestData {
    fn from(bundle: &AnalyticsBundle) -> Self {
        let aggregate = &bundle.aggregate;
        let label = crate::models::SentimentLabel::from_compound(aggregate.mean_compound);

        let flags = bundle
            .risk
            .ranked()
            .into_iter()
            .map(|flag| FlagRow {
                severity: flag.severity.as_str(),
                kind: flag.kind.as_str(),
                evidence: evidence_line(&flag.evidence),
            })
            .collect();

        let skipped = bundle
            .risk
            .skipped_rules
            .iter()
            .map(|s| SkippedRow {
                kind: s.kind.as_str(),
                reason: s.reason.clone(),
            })
            .collect();

        let trends = TrendMetric::all()
            .into_iter()
            .filter_map(|metric| bundle.latest_trend(metric))
            .map(|point| TrendRow {
                metric: point.metric.name(),
                value: format!("{:.3}", point.value),
                delta: format!("{:+.3}", point.delta_from_previous),
                direction: point.direction.as_str(),
            })
            .collect();

        let speakers = bundle
            .speakers
            .iter()
            .map(|s| SpeakerRow {
                name: s.speaker.clone(),
                share: format!("{:.1}%", s.participation_pct),
                units: s.unit_count,
                words: s.word_count,
                avg_compound: format!("{:.3}", s.avg_compound),
                questions: s.question_count,
                engagement: format!("{:.1}", s.engagement_score),
            })
            .collect();

        Self {
            health: health_rows(&bundle.health),
            meeting_id: bundle.meeting_id.clone(),
            date: aggregate.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
            duration: aggregate
                .duration_minutes
                .map(|m| format!("{m} min"))
                .unwrap_or_else(|| "unknown".to_string()),
            unit_count: aggregate.unit_count,
            word_count: aggregate.word_count,
            lexicon: truncate_text(&bundle.lexicon_fingerprint, 12),
            mean_compound: format!("{:.3}", aggregate.mean_compound),
            sentiment_label: label.as_str(),
            negative_ratio: format!("{:.1}%", round_to(aggregate.negative_ratio * 100.0, 1)),
            participation_balance: format!("{:.2}", aggregate.participation_balance),
            risk_level: bundle.risk.risk_level().as_str(),
            risk_score: bundle.risk.risk_score(),
            recommendation: bundle.risk.recommendation(),
            flags,
            skipped,
            trends,
            speakers,
        }
    }
}

fn health_rows(health: &TeamHealth) -> Vec<HealthRow> {
    let mut rows = Vec::new();
    if let Some(dominance) = &health.dominance {
        rows.push(HealthRow {
            check: "dominance",
            level: dominance.check.level.as_str(),
            score: Some(dominance.check.score),
            details: dominance.check.indicators.join("; "),
            recommendation: dominance.check.recommendation.clone(),
        });
    }
    if let Some(burnout) = &health.burnout {
        rows.push(HealthRow {
            check: "burnout",
            level: burnout.level.as_str(),
            score: Some(burnout.score),
            details: burnout.indicators.join("; "),
            recommendation: burnout.recommendation.clone(),
        });
    }
    if let Some(disengagement) = &health.disengagement {
        rows.push(HealthRow {
            check: "disengagement",
            level: disengagement.level.as_str(),
            score: None,
            details: disengagement
                .at_risk_speakers
                .iter()
                .map(|s| {
                    format!(
                        "{} at {:.1} ({:+.1}%)",
                        s.speaker, s.current_engagement, s.decline_percentage
                    )
                })
                .collect::<Vec<_>>()
                .join("; "),
            recommendation: disengagement.recommendation.clone(),
        });
    }
    rows
}

fn evidence_line(evidence: &[String]) -> String {
    let mut line = evidence
        .iter()
        .take(MAX_EVIDENCE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if evidence.len() > MAX_EVIDENCE {
        line.push_str(&format!(" (+{} more)", evidence.len() - MAX_EVIDENCE));
    }
    line
}

/// Markdown digest renderer backed by Handlebars
pub struct DigestRenderer<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> DigestRenderer<'a> {
    /// Create a renderer with the bundled template
    pub fn new() -> Result<Self, ReportError> {
        let mut handlebars = Self::engine();
        handlebars
            .register_template_string(TEMPLATE_NAME, DEFAULT_TEMPLATE)
            .map_err(Box::new)?;
        Ok(Self { handlebars })
    }

    /// Create a renderer with a custom template file
    pub fn with_template(template_path: &Path) -> Result<Self, ReportError> {
        let mut handlebars = Self::engine();
        handlebars
            .register_template_file(TEMPLATE_NAME, template_path)
            .map_err(Box::new)?;
        Ok(Self { handlebars })
    }

    fn engine() -> Handlebars<'a> {
        let mut handlebars = Handlebars::new();
        // Markdown output, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
    }

    /// Render one bundle to Markdown
    pub fn render(&self, bundle: &AnalyticsBundle) -> Result<String, ReportError> {
        let data = DigestData::from(bundle);
        Ok(self.handlebars.render(TEMPLATE_NAME, &data)?)
    }
}
