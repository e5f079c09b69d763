//! Batch runner across teams
//!
//! Meetings are grouped by team. Teams run concurrently; inside a team,
//! meetings run one after another in timestamp order so each sees the
//! history written by the one before it.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::history::HistoryStore;
use super::AnalyticsPipeline;
use crate::error::{Error, Result};
use crate::models::{AnalyticsBundle, MeetingInfo, TextUnit};

/// One meeting queued for batch analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingInput {
    #[serde(flatten)]
    pub meeting: MeetingInfo,
    pub units: Vec<TextUnit>,
}

/// Result of one meeting in a batch
#[derive(Debug)]
pub struct MeetingOutcome {
    pub meeting_id: String,
    pub team_id: String,
    pub result: Result<AnalyticsBundle>,
}

/// Per-meeting outcomes of a batch, grouped by team
#[derive(Debug)]
pub struct BatchReport {
    /// Correlates the batch's log events
    pub batch_id: Uuid,
    pub outcomes: Vec<MeetingOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    /// Bundles of meetings that completed
    pub fn bundles(&self) -> impl Iterator<Item = &AnalyticsBundle> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Meetings that failed or were aborted
    pub fn failures(&self) -> impl Iterator<Item = (&MeetingOutcome, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
    }

    pub fn succeeded(&self) -> usize {
        self.bundles().count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

impl AnalyticsPipeline {
    /// Analyze a batch of meetings and record each aggregate in `store`
    ///
    /// A failing meeting is reported in its outcome and does not stop the
    /// rest of the batch. When `batch_deadline_secs` is set, meetings not
    /// yet started once it passes are reported as [`Error::Aborted`].
    pub async fn run_batch(
        &self,
        meetings: Vec<MeetingInput>,
        store: &dyn HistoryStore,
    ) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let started = Instant::now();
        let deadline = self.settings().batch_deadline().map(|d| started + d);
        let total = meetings.len();

        let mut teams: BTreeMap<String, Vec<MeetingInput>> = BTreeMap::new();
        for input in meetings {
            teams
                .entry(input.meeting.team_id.clone())
                .or_default()
                .push(input);
        }

        tracing::info!(%batch_id, meetings = total, teams = teams.len(), "Starting batch");

        let mut per_team: Vec<Vec<MeetingOutcome>> = stream::iter(teams.into_values())
            .map(|team_meetings| self.run_team(team_meetings, store, deadline))
            .buffer_unordered(self.settings().max_concurrent_teams)
            .collect()
            .await;
        per_team.sort_by(|a, b| {
            let team = |outcomes: &[MeetingOutcome]| outcomes.first().map(|o| o.team_id.clone());
            team(a.as_slice()).cmp(&team(b.as_slice()))
        });

        let report = BatchReport {
            batch_id,
            outcomes: per_team.into_iter().flatten().collect(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            %batch_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch complete"
        );

        report
    }

    /// Single writer for one team's history
    async fn run_team(
        &self,
        mut meetings: Vec<MeetingInput>,
        store: &dyn HistoryStore,
        deadline: Option<Instant>,
    ) -> Vec<MeetingOutcome> {
        meetings.sort_by_key(|input| input.meeting.timestamp);

        let mut outcomes = Vec::with_capacity(meetings.len());
        for input in meetings {
            let result = if deadline.is_some_and(|d| Instant::now() >= d) {
                Err(Error::Aborted {
                    meeting_id: input.meeting.meeting_id.clone(),
                })
            } else {
                self.process(&input, store).await
            };

            if let Err(e) = &result {
                tracing::warn!(
                    meeting_id = %input.meeting.meeting_id,
                    team_id = %input.meeting.team_id,
                    error = %e,
                    "Meeting analysis failed"
                );
            }

            outcomes.push(MeetingOutcome {
                meeting_id: input.meeting.meeting_id,
                team_id: input.meeting.team_id,
                result,
            });
        }
        outcomes
    }

    async fn process(&self, input: &MeetingInput, store: &dyn HistoryStore) -> Result<AnalyticsBundle> {
        let team_id = &input.meeting.team_id;
        let history = store.load(team_id).await?;
        let bundle = self
            .analyze_meeting(&input.meeting, &input.units, &history)
            .await?;
        store.save(team_id, bundle.aggregate.clone()).await?;
        Ok(bundle)
    }
}
