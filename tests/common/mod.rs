//! Common test utilities

use chrono::{DateTime, Duration, TimeZone, Utc};
use meetpulse::models::{MeetingAggregate, MeetingInfo, TextUnit};

/// Monday 2024-01-08 10:00 UTC, the first meeting of every test series
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
}

/// Meeting `week` weeks after [`base_time`]
#[allow(dead_code)]
pub fn meeting_info(team: &str, id: &str, week: i64) -> MeetingInfo {
    MeetingInfo {
        meeting_id: id.to_string(),
        team_id: team.to_string(),
        timestamp: base_time() + Duration::weeks(week),
        duration_minutes: Some(30),
    }
}

/// Stored aggregate `week` weeks after [`base_time`]
#[allow(dead_code)]
pub fn aggregate(id: &str, week: i64, mean_compound: f64) -> MeetingAggregate {
    MeetingAggregate {
        meeting_id: id.to_string(),
        timestamp: base_time() + Duration::weeks(week),
        mean_compound,
        negative_ratio: 0.1,
        unit_count: 20,
        duration_minutes: Some(30),
        word_count: 240,
        participation_balance: 0.8,
        mean_engagement: 50.0,
        speaker_engagement: Default::default(),
    }
}

/// Units `u1..` without speakers
#[allow(dead_code)]
pub fn units(lines: &[&str]) -> Vec<TextUnit> {
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| TextUnit::new(format!("u{}", i + 1), *text))
        .collect()
}
