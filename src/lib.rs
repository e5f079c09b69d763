//! meetpulse - Meeting transcript analytics
//!
//! Turns meeting transcripts into per-utterance sentiment scores, risk flags
//! and cross-meeting trend deltas.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and threshold validation
//! - [`transcript`] - Transcript validation and segmentation into units
//! - [`analytics`] - Sentiment scorer, aggregation, risk detector and trend analyzer
//! - [`pipeline`] - Per-meeting orchestration and the concurrent batch runner
//! - [`report`] - JSON and Markdown rendering of analytics bundles
//! - [`models`] - Core data structures and types
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use meetpulse::analytics::Lexicon;
//! use meetpulse::config::Config;
//! use meetpulse::models::MeetingInfo;
//! use meetpulse::pipeline::AnalyticsPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = AnalyticsPipeline::new(&Config::default(), Lexicon::default())?;
//!     let units = meetpulse::transcript::parse("Ana: Great sprint!\nBen: Agreed, nice work.");
//!     let meeting = MeetingInfo {
//!         meeting_id: "standup-1".to_string(),
//!         team_id: "core".to_string(),
//!         timestamp: chrono::Utc::now(),
//!         duration_minutes: Some(15),
//!     };
//!     let bundle = pipeline.analyze_meeting(&meeting, &units, &[]).await?;
//!     println!("{}", meetpulse::report::render_json(&bundle)?);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod transcript;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        Aggregator, HealthAnalyzer, Lexicon, RiskDetector, SentimentScorer, TrendAnalyzer,
        TrendSummary,
    };
    pub use crate::config::{Config, Thresholds};
    pub use crate::error::{Error, ErrorCategory, MeetpulseErrorTrait, Result};
    pub use crate::models::{
        AnalyticsBundle, MeetingAggregate, MeetingInfo, RiskFlag, RiskKind, RiskReport,
        SentimentScore, Severity, TeamHealth, TextUnit, TrendDirection, TrendMetric, TrendPoint,
    };
    pub use crate::pipeline::{AnalyticsPipeline, HistoryStore, InMemoryHistoryStore};
    pub use crate::report::DigestRenderer;
}

// Direct re-exports for convenience
pub use models::{AnalyticsBundle, MeetingAggregate, SentimentScore, TextUnit};
