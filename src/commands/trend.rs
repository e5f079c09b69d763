use anyhow::{bail, Context, Result};
use std::path::Path;

use meetpulse::analytics::TrendAnalyzer;
use meetpulse::config::Config;
use meetpulse::models::TrendMetric;

use super::load_history;

pub async fn trend(config: &Config, history_path: &Path, team: &str, metric: &str) -> Result<()> {
    let metrics: Vec<TrendMetric> = if metric == "all" {
        TrendMetric::all().to_vec()
    } else {
        match TrendMetric::parse(metric) {
            Some(m) => vec![m],
            None => bail!(
                "Unknown metric '{metric}' (expected one of: all, {})",
                TrendMetric::all().map(|m| m.name()).join(", ")
            ),
        }
    };

    let history = load_history(history_path)?;
    let Some(series) = history.get(team) else {
        println!("No history recorded for team '{team}'");
        return Ok(());
    };

    let thresholds = config.thresholds.build()?;
    let analyzer = TrendAnalyzer::from_thresholds(&thresholds);

    println!("Trends for team '{team}' ({} meetings)", series.len());
    println!("================================");

    for metric in metrics {
        let points = analyzer
            .analyze_metric(series, metric)
            .with_context(|| format!("Failed to compute {metric} trend"))?;

        println!("\n{metric}");
        for point in &points {
            println!(
                "  {:<24} {:>10.3} {:>+9.3}  {}",
                point.meeting_id,
                point.value,
                point.delta_from_previous,
                point.direction.as_str()
            );
        }

        match analyzer.summarize(series, metric)? {
            Some(summary) => println!(
                "  summary: {} ({:+.1}%, {:.3} -> {:.3})",
                summary.direction.as_str(),
                summary.change_percentage,
                summary.previous_avg,
                summary.current_avg
            ),
            None => println!("  summary: insufficient data"),
        }
    }

    Ok(())
}
