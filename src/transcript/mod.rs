//! Transcript validation and segmentation
//!
//! Turns raw transcript text into [`TextUnit`]s, one per speaker turn.
//! Two line formats are recognized:
//!
//! - colon: `Alice: Let's get started`
//! - timestamped: `[09:05] Alice: Let's get started` (seconds and brackets optional)

use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::TextUnit;

/// Minimum transcript length in characters, after trimming
pub const MIN_TRANSCRIPT_CHARS: usize = 20;

/// Minimum number of `Speaker: message` lines
pub const MIN_SPEAKER_LINES: usize = 2;

/// Number of non-empty lines inspected when detecting the format
const FORMAT_SAMPLE_LINES: usize = 10;

/// Reasons a transcript is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcript is empty")]
    Empty,

    #[error("Transcript is too short ({chars} characters, minimum 20)")]
    TooShort { chars: usize },

    #[error("Found {found} speaker lines, expected at least 2 in 'Speaker: message' form")]
    NoSpeakerLines { found: usize },
}

/// Line format of a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Colon,
    Timestamped,
}

fn colon_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^:]+):\s*(.+)$").expect("Invalid regex pattern"))
}

fn timestamp_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[?(\d{1,2}):(\d{2})(?::(\d{2}))?\]?\s+([^:]+):\s*(.+)$")
            .expect("Invalid regex pattern")
    })
}

fn embedded_timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[?\d{1,2}:\d{2}(?::\d{2})?\]?").expect("Invalid regex pattern")
    })
}

/// Check that text looks like a speaker-attributed transcript
pub fn validate(text: &str) -> Result<(), TranscriptError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TranscriptError::Empty);
    }

    let chars = trimmed.chars().count();
    if chars < MIN_TRANSCRIPT_CHARS {
        return Err(TranscriptError::TooShort { chars });
    }

    let found = trimmed
        .lines()
        .filter_map(|line| line.trim().split_once(':'))
        .filter(|(speaker, message)| !speaker.trim().is_empty() && !message.trim().is_empty())
        .count();
    if found < MIN_SPEAKER_LINES {
        return Err(TranscriptError::NoSpeakerLines { found });
    }

    Ok(())
}

/// Detect the line format from the first few non-empty lines
///
/// Timestamped wins only when more than half of the sample matches it.
pub fn detect_format(text: &str) -> TranscriptFormat {
    let sample: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(FORMAT_SAMPLE_LINES)
        .collect();

    let timestamped = sample
        .iter()
        .filter(|line| timestamp_line_re().is_match(line))
        .count();

    if timestamped * 2 > sample.len() {
        TranscriptFormat::Timestamped
    } else {
        TranscriptFormat::Colon
    }
}

/// Split a transcript into units
///
/// Lines that do not match the detected format are skipped. Unit ids are
/// `u1`, `u2`, ... in transcript order.
pub fn parse(text: &str) -> Vec<TextUnit> {
    let format = detect_format(text);
    let mut units = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed = match format {
            TranscriptFormat::Colon => colon_line_re()
                .captures(line)
                .map(|caps| (caps[1].to_string(), caps[2].trim().to_string(), None)),
            TranscriptFormat::Timestamped => timestamp_line_re().captures(line).map(|caps| {
                let time = clock_time(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()));
                (caps[4].to_string(), caps[5].trim().to_string(), time)
            }),
        };

        let Some((speaker, message, timestamp)) = parsed else {
            continue;
        };
        if message.is_empty() {
            continue;
        }

        let speaker = clean_speaker_name(&speaker);
        units.push(TextUnit {
            id: format!("u{}", units.len() + 1),
            text: message,
            speaker: (!speaker.is_empty()).then_some(speaker),
            timestamp,
        });
    }

    tracing::debug!(?format, units = units.len(), "Parsed transcript");
    units
}

/// Normalize a speaker name: strip stray timestamps and title-case each word
pub fn clean_speaker_name(raw: &str) -> String {
    let stripped = embedded_timestamp_re().replace_all(raw.trim(), "");
    stripped
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Out-of-range clock values leave the unit without a timestamp
fn clock_time(hours: &str, minutes: &str, seconds: Option<&str>) -> Option<NaiveTime> {
    let h = hours.parse().ok()?;
    let m = minutes.parse().ok()?;
    let s = seconds.map_or(Some(0), |s| s.parse().ok())?;
    NaiveTime::from_hms_opt(h, m, s)
}
