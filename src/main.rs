mod commands;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{AnalyzeParams, ReportFormat};

#[derive(Parser)]
#[command(
    name = "meetpulse",
    version,
    about = "Meeting transcript analytics: sentiment, risk flags and trends",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the sentiment of a text or transcript
    Score {
        /// Text to score
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Transcript or text file to score
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print scores as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Analyze one meeting transcript
    Analyze {
        /// Transcript file
        transcript: PathBuf,

        /// Meeting identifier
        #[arg(long)]
        meeting_id: String,

        /// Team whose history the meeting belongs to
        #[arg(long)]
        team: String,

        /// Meeting start (RFC 3339, e.g. 2024-05-20T15:00:00Z)
        #[arg(long)]
        timestamp: DateTime<Utc>,

        /// Meeting duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// History file (JSON, team id -> aggregates)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Record this meeting's aggregate in the history file
        #[arg(long, default_value = "false", requires = "history")]
        save: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormat,

        /// Custom Handlebars digest template
        #[arg(long)]
        template: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show cross-meeting trends for a team
    Trend {
        /// History file (JSON, team id -> aggregates)
        #[arg(long)]
        history: PathBuf,

        /// Team id
        #[arg(long)]
        team: String,

        /// Metric name or "all"
        #[arg(short, long, default_value = "all")]
        metric: String,
    },

    /// Analyze every meeting in a manifest
    Batch {
        /// Manifest file (JSON array of meetings)
        manifest: PathBuf,

        /// History file to read and update
        #[arg(long)]
        history: Option<PathBuf>,

        /// Directory for per-meeting JSON bundles and digests
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(config = ?cli.config, "meetpulse starting");

    match cli.command {
        Commands::Score { text, file, json } => {
            tracing::info!(file = ?file, json = %json, "Starting score command");
            commands::score(&config, text, file, json).await?;
        }

        Commands::Analyze {
            transcript,
            meeting_id,
            team,
            timestamp,
            duration,
            history,
            save,
            format,
            template,
            output,
        } => {
            tracing::info!(
                transcript = %transcript.display(),
                meeting_id = %meeting_id,
                team = %team,
                "Starting analyze command"
            );
            let params = AnalyzeParams {
                transcript,
                meeting_id,
                team,
                timestamp,
                duration,
                history,
                save,
                format,
                template,
                output,
            };
            commands::analyze(&config, params).await?;
        }

        Commands::Trend {
            history,
            team,
            metric,
        } => {
            tracing::info!(
                history = %history.display(),
                team = %team,
                metric = %metric,
                "Starting trend command"
            );
            commands::trend(&config, &history, &team, &metric).await?;
        }

        Commands::Batch {
            manifest,
            history,
            output_dir,
        } => {
            tracing::info!(
                manifest = %manifest.display(),
                history = ?history,
                output_dir = ?output_dir,
                "Starting batch command"
            );
            commands::batch(&config, &manifest, history.as_deref(), output_dir.as_deref())
                .await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("meetpulse=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("meetpulse={level},warn")))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
