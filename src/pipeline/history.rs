//! Team history persistence boundary

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::MeetingAggregate;

/// Entries that cannot coexist in one team's history
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Meeting {meeting_id} collides with {existing}: both recorded at {timestamp}")]
    TimestampCollision {
        meeting_id: String,
        existing: String,
        timestamp: DateTime<Utc>,
    },
}

/// Storage for each team's meeting aggregates, oldest first
///
/// The batch runner gives each team a single writer, so implementations
/// only need to guard against concurrent access across teams.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Aggregates recorded for a team in chronological order
    async fn load(&self, team_id: &str) -> Result<Vec<MeetingAggregate>>;

    /// Record an aggregate, replacing any previous one for the same meeting
    async fn save(&self, team_id: &str, aggregate: MeetingAggregate) -> Result<()>;
}

/// Reject a meeting that shares its timestamp with a different stored meeting
pub fn check_collision(
    history: &[MeetingAggregate],
    meeting_id: &str,
    timestamp: DateTime<Utc>,
) -> std::result::Result<(), HistoryError> {
    match history
        .iter()
        .find(|a| a.timestamp == timestamp && a.meeting_id != meeting_id)
    {
        Some(existing) => Err(HistoryError::TimestampCollision {
            meeting_id: meeting_id.to_string(),
            existing: existing.meeting_id.clone(),
            timestamp,
        }),
        None => Ok(()),
    }
}

/// Insert keeping strict chronological order; an existing entry for the same
/// meeting is replaced wholesale.
///
/// History is left untouched when the aggregate collides with another meeting.
pub fn upsert_chronological(
    history: &mut Vec<MeetingAggregate>,
    aggregate: MeetingAggregate,
) -> std::result::Result<(), HistoryError> {
    check_collision(history, &aggregate.meeting_id, aggregate.timestamp)?;
    history.retain(|existing| existing.meeting_id != aggregate.meeting_id);
    let pos = history.partition_point(|existing| existing.timestamp < aggregate.timestamp);
    history.insert(pos, aggregate);
    Ok(())
}

/// Process-local history store
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    teams: RwLock<HashMap<String, Vec<MeetingAggregate>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. from a history file loaded by the caller
    pub fn with_history(
        teams: HashMap<String, Vec<MeetingAggregate>>,
    ) -> std::result::Result<Self, HistoryError> {
        let mut seeded = HashMap::with_capacity(teams.len());
        for (team, entries) in teams {
            let mut history = Vec::with_capacity(entries.len());
            for aggregate in entries {
                upsert_chronological(&mut history, aggregate)?;
            }
            seeded.insert(team, history);
        }

        Ok(Self {
            teams: RwLock::new(seeded),
        })
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, team_id: &str) -> Result<Vec<MeetingAggregate>> {
        Ok(self
            .teams
            .read()
            .await
            .get(team_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, team_id: &str, aggregate: MeetingAggregate) -> Result<()> {
        let mut teams = self.teams.write().await;
        upsert_chronological(teams.entry(team_id.to_string()).or_default(), aggregate)?;
        Ok(())
    }
}
