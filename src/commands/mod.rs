pub mod analyze;
pub mod batch;
pub mod history_store;
pub mod score;
pub mod trend;

// Re-export command functions for convenience
pub use analyze::{analyze, AnalyzeParams};
pub use batch::batch;
pub use history_store::JsonHistoryStore;
pub use score::score;
pub use trend::trend;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use meetpulse::analytics::Lexicon;
use meetpulse::config::Config;
use meetpulse::models::{MeetingAggregate, TextUnit};
use meetpulse::transcript;

/// Team id → aggregates, as stored in a history file
pub type HistoryFile = HashMap<String, Vec<MeetingAggregate>>;

/// Output format for single-meeting reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

/// Load the config file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Configured lexicon, falling back to the bundled one
pub fn load_lexicon(config: &Config) -> Result<Lexicon> {
    match &config.scoring.lexicon_path {
        Some(path) => {
            let lexicon = Lexicon::load(path)
                .with_context(|| format!("Failed to load lexicon {}", path.display()))?;
            tracing::info!(path = %path.display(), terms = lexicon.len(), "Loaded lexicon");
            Ok(lexicon)
        }
        None => Ok(Lexicon::default()),
    }
}

/// Read, validate and segment a transcript file
pub fn read_transcript(path: &Path) -> Result<Vec<TextUnit>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    transcript::validate(&text)
        .with_context(|| format!("Rejected transcript {}", path.display()))?;
    Ok(transcript::parse(&text))
}

/// Load a history file; a missing file is an empty history
pub fn load_history(path: &Path) -> Result<HistoryFile> {
    if !path.exists() {
        return Ok(HistoryFile::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history {}", path.display()))
}
