use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use meetpulse::config::Config;
use meetpulse::error::MeetpulseErrorTrait;
use meetpulse::models::MeetingInfo;
use meetpulse::pipeline::{AnalyticsPipeline, HistoryStore, InMemoryHistoryStore, MeetingInput};
use meetpulse::report::{render_json, DigestRenderer};

use super::{load_lexicon, read_transcript, JsonHistoryStore};

/// One meeting listed in a batch manifest
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    meeting_id: String,
    team_id: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    duration_minutes: Option<u32>,
    /// Transcript path, relative to the manifest
    transcript: PathBuf,
}

pub async fn batch(
    config: &Config,
    manifest: &Path,
    history_path: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse manifest {}", manifest.display()))?;
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));

    let mut inputs = Vec::with_capacity(entries.len());
    let mut rejected = 0usize;
    for entry in entries {
        match read_transcript(&base.join(&entry.transcript)) {
            Ok(units) => inputs.push(MeetingInput {
                meeting: MeetingInfo {
                    meeting_id: entry.meeting_id,
                    team_id: entry.team_id,
                    timestamp: entry.timestamp,
                    duration_minutes: entry.duration_minutes,
                },
                units,
            }),
            Err(e) => {
                rejected += 1;
                tracing::warn!(meeting_id = %entry.meeting_id, error = %format!("{e:#}"), "Skipping meeting");
            }
        }
    }

    // file-backed history is written after every meeting
    let store: Box<dyn HistoryStore> = match history_path {
        Some(path) => Box::new(JsonHistoryStore::open(path)?),
        None => Box::new(InMemoryHistoryStore::new()),
    };

    let pipeline = AnalyticsPipeline::new(config, load_lexicon(config)?)?;
    let report = pipeline.run_batch(inputs, store.as_ref()).await;

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let renderer = DigestRenderer::new()?;
        for bundle in report.bundles() {
            let id = &bundle.meeting_id;
            std::fs::write(dir.join(format!("{id}.json")), render_json(bundle)?)?;
            std::fs::write(dir.join(format!("{id}.md")), renderer.render(bundle)?)?;
        }
    }

    println!("Batch {} finished in {:.2?}", report.batch_id, report.elapsed);
    println!("================================");
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(bundle) => println!(
                "  ok      {:<12} {:<24} risk {} ({})",
                outcome.team_id,
                outcome.meeting_id,
                bundle.risk.risk_level().as_str(),
                bundle.risk.risk_score()
            ),
            Err(e) => println!(
                "  {:<7} {:<12} {:<24} {e}",
                if e.is_recoverable() { "retry" } else { "failed" },
                outcome.team_id,
                outcome.meeting_id,
            ),
        }
    }
    println!(
        "\n{} succeeded, {} failed, {} rejected transcripts",
        report.succeeded(),
        report.failed(),
        rejected
    );

    Ok(())
}
