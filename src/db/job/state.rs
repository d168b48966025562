use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use thiserror::Error;

/// The job lifecycle of a row, stored in the single `state` column
///
/// ```text
/// not_queued -> queued -> running -> converged
///      |           ^         ^  |
///      +-----------|---------+  +----> failed
///                  +-- converged / failed (re-queue)
///
/// `run` may start a row straight from `not_queued`; `queue` is only needed to re-submit.
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum JobState {
    NotQueued,
    Queued,
    Running,
    Converged,
    Failed,
}

/// Boolean view of a state, as the older `queued`/`started`/`converged` key-value pairs
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Flags {
    pub queued: bool,
    pub started: bool,
    pub converged: bool,
}

#[derive(Debug, Error)]
#[error("unknown job state {0:?}")]
pub struct UnknownState(pub String);

impl JobState {
    pub const ALL: [JobState; 5] = [
        JobState::NotQueued,
        JobState::Queued,
        JobState::Running,
        JobState::Converged,
        JobState::Failed,
    ];

    /// db values are snake case
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::NotQueued => "not_queued",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Converged => "converged",
            JobState::Failed => "failed",
        }
    }

    /// States a row may be in to move to `self`
    pub fn sources(&self) -> &'static [JobState] {
        match self {
            JobState::NotQueued => &[],
            JobState::Queued => &[JobState::NotQueued, JobState::Queued, JobState::Converged, JobState::Failed],
            JobState::Running => &[JobState::NotQueued, JobState::Queued],
            JobState::Converged | JobState::Failed => &[JobState::Running],
        }
    }

    pub fn can_move_to(&self, to: JobState) -> bool {
        to.sources().contains(self)
    }

    pub fn flags(&self) -> Flags {
        let (queued, started, converged) = match self {
            JobState::NotQueued => (false, false, false),
            JobState::Queued => (true, false, false),
            JobState::Running | JobState::Failed => (true, true, false),
            JobState::Converged => (true, true, true),
        };
        Flags { queued, started, converged }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

impl ToSql for JobState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for JobState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}
