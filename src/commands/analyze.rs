use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use meetpulse::config::Config;
use meetpulse::models::MeetingInfo;
use meetpulse::pipeline::{AnalyticsPipeline, HistoryStore};
use meetpulse::report::{render_json, DigestRenderer};

use super::{load_lexicon, read_transcript, JsonHistoryStore, ReportFormat};

/// Parameters for analyzing one transcript
#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub transcript: PathBuf,
    pub meeting_id: String,
    pub team: String,
    pub timestamp: DateTime<Utc>,
    pub duration: Option<u32>,
    pub history: Option<PathBuf>,
    pub save: bool,
    pub format: ReportFormat,
    pub template: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

pub async fn analyze(config: &Config, params: AnalyzeParams) -> Result<()> {
    let units = read_transcript(&params.transcript)?;
    let pipeline = AnalyticsPipeline::new(config, load_lexicon(config)?)?;

    let store = params
        .history
        .as_deref()
        .map(JsonHistoryStore::open)
        .transpose()?;
    let team_history = match &store {
        Some(store) => store.load(&params.team).await?,
        None => Vec::new(),
    };

    let meeting = MeetingInfo {
        meeting_id: params.meeting_id.clone(),
        team_id: params.team.clone(),
        timestamp: params.timestamp,
        duration_minutes: params.duration,
    };

    let bundle = pipeline
        .analyze_meeting(&meeting, &units, &team_history)
        .await
        .with_context(|| format!("Failed to analyze meeting {}", meeting.meeting_id))?;

    let rendered = match params.format {
        ReportFormat::Json => render_json(&bundle)?,
        ReportFormat::Markdown => {
            let renderer = match &params.template {
                Some(path) => DigestRenderer::with_template(path)?,
                None => DigestRenderer::new()?,
            };
            renderer.render(&bundle)?
        }
    };

    match &params.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if params.save {
        if let Some(store) = &store {
            store.save(&params.team, bundle.aggregate.clone()).await?;
            tracing::info!(path = %store.path().display(), team = %params.team, "History updated");
        }
    }

    Ok(())
}
