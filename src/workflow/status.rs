use anyhow::Result;
use rusqlite::Connection;

use crate::db::job::load::{count_by_state, select_ids};
use crate::db::job::state::JobState;
use crate::db::RowId;

/// Row counts per state, plus the rows that need an operator's attention
#[derive(Debug)]
pub struct StatusReport {
    pub counts: Vec<(JobState, i64)>,
    /// Running rows; after a crash these are stuck until re-queued with `--force`
    pub running: Vec<RowId>,
    pub failed: Vec<RowId>,
}

impl StatusReport {
    pub fn total(&self) -> i64 {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

pub fn status(conn: &Connection) -> Result<StatusReport> {
    Ok(StatusReport {
        counts: count_by_state(conn)?,
        running: select_ids(conn, &[JobState::Running])?,
        failed: select_ids(conn, &[JobState::Failed])?,
    })
}
