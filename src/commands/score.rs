use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use meetpulse::analytics::SentimentScorer;
use meetpulse::config::Config;
use meetpulse::models::TextUnit;
use meetpulse::transcript;
use meetpulse::utils::truncate_text;

use super::load_lexicon;

pub async fn score(
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let input = match (text, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => bail!("Provide exactly one of --text or --file"),
    };

    // Plain text without speaker lines is scored as a single unit
    let mut units = transcript::parse(&input);
    if units.is_empty() {
        units.push(TextUnit::new("u1", input.trim()));
    }

    let scorer = SentimentScorer::new(load_lexicon(config)?);
    let scores: Vec<_> = units.iter().map(|unit| scorer.score(unit)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(());
    }

    println!("Scored {} utterances", scores.len());
    println!("================================");
    for (unit, score) in units.iter().zip(&scores) {
        println!(
            "{:>4} {:<9} {:+.3}  pos {:.2} neu {:.2} neg {:.2}  {}{}",
            unit.id,
            score.label().as_str(),
            score.compound,
            score.positive,
            score.neutral,
            score.negative,
            unit.speaker
                .as_deref()
                .map(|s| format!("{s}: "))
                .unwrap_or_default(),
            truncate_text(&unit.text, 60)
        );
    }

    Ok(())
}
