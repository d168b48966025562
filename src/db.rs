//! All job state is stored in a SQLite database
//!
//! One row per structure in the `systems` table. Every write is a single statement, so concurrent
//! jobs sharing a store are serialised by SQLite itself.

use thiserror::Error;

use crate::db::job::state::JobState;

/// Connect to a SQLite database
pub mod open;
pub mod job;
/// Add new structures to the store
pub mod ingest;

/// Row ids are SQLite rowids
pub type RowId = i64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed JSON in row: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no row with id {0}")]
    NotFound(RowId),
    #[error("row {id} can't move from {from} to {to}")]
    IllegalTransition { id: RowId, from: JobState, to: JobState },
    #[error("row {0} has no calculator attached")]
    NoCalculator(RowId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Timestamp stored in `ctime` and `mtime`
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
