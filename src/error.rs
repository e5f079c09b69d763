//! Unified error handling for the meetpulse crate
//!
//! Each analytics stage keeps its own `thiserror` enum. This module gathers
//! them into a single [`Error`] so the pipeline and the CLI can cross module
//! boundaries without losing the detailed cause.
//!
//! # Architecture
//!
//! - [`MeetpulseErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use meetpulse::error::{Error, ErrorCategory, MeetpulseErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying after: {err}");
//!     } else {
//!         eprintln!("Fatal error ({}): {err}", err.category());
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::analytics::aggregate::AggregateError;
pub use crate::analytics::lexicon::LexiconError;
pub use crate::analytics::risk::RiskError;
pub use crate::analytics::trend::TrendError;
pub use crate::config::ConfigError;
pub use crate::pipeline::history::HistoryError;
pub use crate::report::ReportError;
pub use crate::transcript::TranscriptError;

/// Common trait for meetpulse error types
pub trait MeetpulseErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the same work may succeed later)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input: unit/score mismatch, bad history, bad transcript
    Validation,
    /// Thresholds, lexicon or config file problems
    Configuration,
    /// History store and file I/O errors
    Storage,
    /// JSON encoding/decoding and report rendering errors
    Serialization,
    /// Work cancelled before it started
    Aborted,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Storage => "storage",
            Self::Serialization => "serialization",
            Self::Aborted => "aborted",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the meetpulse crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid thresholds or config file
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Lexicon loading errors
    #[error("Lexicon error: {0}")]
    Lexicon(#[from] LexiconError),

    /// Transcript validation errors
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Units and scores that do not line up
    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Invalid input to risk detection
    #[error("Risk detection error: {0}")]
    Risk(#[from] RiskError),

    /// Invalid history for trend analysis
    #[error("Trend error: {0}")]
    Trend(#[from] TrendError),

    /// Meeting conflicts with the team's stored history
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Digest or JSON rendering errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// History store failures
    #[error("Storage error for team {team_id}: {reason}")]
    Storage { team_id: String, reason: String },

    /// Meeting not started because the batch ran out of time
    #[error("Meeting {meeting_id} aborted: batch deadline exceeded")]
    Aborted { meeting_id: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MeetpulseErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true, // I/O errors are often transient
            Self::Aborted { .. } => true,
            Self::Config(_)
            | Self::Lexicon(_)
            | Self::Transcript(_)
            | Self::Aggregate(_)
            | Self::Risk(_)
            | Self::Trend(_)
            | Self::History(_)
            | Self::Report(_)
            | Self::Storage { .. }
            | Self::Json(_)
            | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => match e {
                ConfigError::Read { .. } => ErrorCategory::Storage,
                _ => ErrorCategory::Configuration,
            },
            Self::Lexicon(e) => match e {
                LexiconError::Read { .. } => ErrorCategory::Storage,
                _ => ErrorCategory::Configuration,
            },
            Self::Transcript(_)
            | Self::Aggregate(_)
            | Self::Risk(_)
            | Self::Trend(_)
            | Self::History(_) => ErrorCategory::Validation,
            Self::Storage { .. } | Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) | Self::Report(_) => ErrorCategory::Serialization,
            Self::Aborted { .. } => ErrorCategory::Aborted,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a storage error
    pub fn storage(team_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            team_id: team_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
