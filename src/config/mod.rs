//! Configuration management for meetpulse
//!
//! This module handles loading and validating configuration from TOML files.
//! The analytics core never reads files itself: callers load a [`Config`],
//! build [`Thresholds`] from it and pass those into the components.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("Invalid alert keyword: {0:?}")]
    InvalidKeyword(String),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Risk and trend thresholds
    pub thresholds: ThresholdSettings,

    /// Sentiment scoring configuration
    pub scoring: ScoringConfig,

    /// Batch pipeline configuration
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Raw threshold values as written in the config file
///
/// All numbers are deployment defaults meant to be tuned, not derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    /// Meeting negative ratio above which NEGATIVE_SPIKE fires, in (0, 1]
    pub negative_spike_ratio: f64,

    /// Number of prior meetings averaged for SENTIMENT_DECLINE
    pub decline_window: usize,

    /// Drop in mean compound below the window mean that counts as a decline
    pub decline_delta: f64,

    /// Expected units per minute of meeting; `None` disables LOW_ENGAGEMENT
    pub low_engagement_baseline: Option<f64>,

    /// Words or phrases that always raise KEYWORD_ALERT
    pub alert_keywords: Vec<String>,

    /// Tolerance below which a trend delta counts as stable
    pub trend_epsilon: f64,

    /// A unit counts as negative when its negative component exceeds this
    pub negative_unit_threshold: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            negative_spike_ratio: 0.35,
            decline_window: 3,
            decline_delta: 0.15,
            low_engagement_baseline: None,
            alert_keywords: Vec::new(),
            trend_epsilon: 0.02,
            negative_unit_threshold: 0.3,
        }
    }
}

impl ThresholdSettings {
    /// Validate every value and compile the keyword matcher
    pub fn build(&self) -> Result<Thresholds, ConfigError> {
        check_range(
            "negative_spike_ratio",
            self.negative_spike_ratio,
            |v| v > 0.0 && v <= 1.0,
            "0 < value <= 1",
        )?;
        check_range(
            "decline_delta",
            self.decline_delta,
            |v| v > 0.0 && v <= 2.0,
            "0 < value <= 2",
        )?;
        check_range(
            "trend_epsilon",
            self.trend_epsilon,
            |v| (0.0..1.0).contains(&v),
            "0 <= value < 1",
        )?;
        check_range(
            "negative_unit_threshold",
            self.negative_unit_threshold,
            |v| (0.0..=1.0).contains(&v),
            "0 <= value <= 1",
        )?;
        if let Some(rate) = self.low_engagement_baseline {
            check_range(
                "low_engagement_baseline",
                rate,
                |v| v > 0.0,
                "positive units per minute",
            )?;
        }
        if self.decline_window == 0 {
            return Err(ConfigError::Invalid {
                field: "decline_window",
                reason: "must be at least 1".to_string(),
            });
        }

        let keywords = normalize_keywords(&self.alert_keywords)?;
        let keyword_pattern = compile_keywords(&keywords)?;

        Ok(Thresholds {
            negative_spike_ratio: self.negative_spike_ratio,
            decline_window: self.decline_window,
            decline_delta: self.decline_delta,
            low_engagement_baseline: self.low_engagement_baseline,
            alert_keywords: keywords,
            keyword_pattern,
            trend_epsilon: self.trend_epsilon,
            negative_unit_threshold: self.negative_unit_threshold,
        })
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    valid: impl Fn(f64) -> bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && valid(value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn normalize_keywords(raw: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut keywords: Vec<String> = Vec::with_capacity(raw.len());
    for keyword in raw {
        let normalized = crate::utils::normalize_whitespace(keyword).to_lowercase();
        if normalized.is_empty() || !normalized.chars().any(char::is_alphanumeric) {
            return Err(ConfigError::InvalidKeyword(keyword.clone()));
        }
        if !keywords.contains(&normalized) {
            keywords.push(normalized);
        }
    }
    Ok(keywords)
}

fn compile_keywords(keywords: &[String]) -> Result<Option<Regex>, ConfigError> {
    if keywords.is_empty() {
        return Ok(None);
    }

    // Phrases match across any run of whitespace
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| {
            k.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    // A keyword must not touch a word character on either side. `\b` would
    // never match next to a keyword edge like the `+` in "c++".
    let pattern = format!(r"(?i)(?:^|\W)(?:{})(?:\W|$)", alternatives.join("|"));

    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            field: "alert_keywords",
            reason: e.to_string(),
        })
}

/// Validated thresholds consumed by the detector and the trend analyzer
#[derive(Debug, Clone)]
pub struct Thresholds {
    negative_spike_ratio: f64,
    decline_window: usize,
    decline_delta: f64,
    low_engagement_baseline: Option<f64>,
    alert_keywords: Vec<String>,
    keyword_pattern: Option<Regex>,
    trend_epsilon: f64,
    negative_unit_threshold: f64,
}

impl Thresholds {
    pub fn negative_spike_ratio(&self) -> f64 {
        self.negative_spike_ratio
    }

    pub fn decline_window(&self) -> usize {
        self.decline_window
    }

    pub fn decline_delta(&self) -> f64 {
        self.decline_delta
    }

    pub fn low_engagement_baseline(&self) -> Option<f64> {
        self.low_engagement_baseline
    }

    /// Lowercased, whitespace-normalized keywords
    pub fn alert_keywords(&self) -> &[String] {
        &self.alert_keywords
    }

    /// Case-insensitive whole-word matcher, `None` when no keywords are set
    pub fn keyword_pattern(&self) -> Option<&Regex> {
        self.keyword_pattern.as_ref()
    }

    pub fn trend_epsilon(&self) -> f64 {
        self.trend_epsilon
    }

    pub fn negative_unit_threshold(&self) -> f64 {
        self.negative_unit_threshold
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            negative_spike_ratio: 0.35,
            decline_window: 3,
            decline_delta: 0.15,
            low_engagement_baseline: None,
            alert_keywords: Vec::new(),
            keyword_pattern: None,
            trend_epsilon: 0.02,
            negative_unit_threshold: 0.3,
        }
    }
}

/// Sentiment scoring configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Custom lexicon file; the bundled lexicon is used when unset
    pub lexicon_path: Option<PathBuf>,
}

/// Batch pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of units scored concurrently
    pub max_concurrent: usize,

    /// Maximum number of teams processed concurrently in a batch
    pub max_concurrent_teams: usize,

    /// Stop starting new meetings once a batch has run this long
    pub batch_deadline_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            max_concurrent_teams: 4,
            batch_deadline_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Get batch deadline as Duration
    #[must_use]
    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch_deadline_secs.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.build()?;

        if self.pipeline.max_concurrent == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.max_concurrent",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.pipeline.max_concurrent_teams == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.max_concurrent_teams",
                reason: "must be greater than 0".to_string(),
            });
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid {
                field: "logging.format",
                reason: format!("unknown format {:?}", self.logging.format),
            });
        }

        Ok(())
    }
}
