//! Meeting analytics: sentiment scoring, aggregation, risk detection,
//! team-health checks and cross-meeting trends

pub mod aggregate;
pub mod health;
pub mod lexicon;
pub mod risk;
pub mod sentiment;
pub mod trend;

pub use aggregate::{
    engagement_score, index_scores, is_question, mean_engagement, negative_units,
    participation_balance, speaker_metrics, AggregateError, Aggregator,
};
pub use health::HealthAnalyzer;
pub use lexicon::{Lexicon, LexiconError};
pub use risk::{RiskDetector, RiskError};
pub use sentiment::SentimentScorer;
pub use trend::{TrendAnalyzer, TrendError, TrendResult, TrendSummary};
