//! History file store used by the CLI
//!
//! The whole file is rewritten on every save so that a crash mid-batch
//! keeps everything recorded so far.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use meetpulse::error::{Error, Result as StoreResult};
use meetpulse::models::MeetingAggregate;
use meetpulse::pipeline::history::{upsert_chronological, HistoryStore};

use super::{load_history, HistoryFile};

/// JSON history file, team id → aggregates
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    teams: Mutex<HistoryFile>,
}

impl JsonHistoryStore {
    /// Open a history file; a missing file starts an empty history
    pub fn open(path: &Path) -> Result<Self> {
        let mut teams = HistoryFile::new();
        for (team, entries) in load_history(path)? {
            let history = teams.entry(team.clone()).or_default();
            for aggregate in entries {
                upsert_chronological(history, aggregate)
                    .with_context(|| format!("Invalid history for team {team}"))?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            teams: Mutex::new(teams),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, teams: &HistoryFile) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(teams)?;
        tokio::fs::write(&self.path, json).await
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn load(&self, team_id: &str) -> StoreResult<Vec<MeetingAggregate>> {
        Ok(self
            .teams
            .lock()
            .await
            .get(team_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, team_id: &str, aggregate: MeetingAggregate) -> StoreResult<()> {
        let mut teams = self.teams.lock().await;
        let previous = teams.get(team_id).cloned();
        upsert_chronological(teams.entry(team_id.to_string()).or_default(), aggregate)?;

        if let Err(e) = self.persist(&teams).await {
            // keep memory in step with the file
            match previous {
                Some(history) => teams.insert(team_id.to_string(), history),
                None => teams.remove(team_id),
            };
            return Err(Error::storage(
                team_id,
                format!("failed to write {}: {e}", self.path.display()),
            ));
        }

        tracing::debug!(team_id = %team_id, path = %self.path.display(), "History saved");
        Ok(())
    }
}
