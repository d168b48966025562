use anyhow::{bail, Result};
use log::{info, warn};
use rusqlite::Connection;

use crate::config::MarkerFiles;
use crate::db::job::state::JobState;
use crate::db::job::update::{force_transition, transition};
use crate::db::RowId;
use crate::workflow::marker::{read_marker, MarkerError};
use crate::WorkingDirectory;

/// Mark the row named by the queue marker in `job_dir` as queued
///
/// Progress of earlier runs is cleared. A running row is only re-queued with `force`, which is
/// meant for rows left running by a job that died.
pub fn queue(conn: &Connection, job_dir: &WorkingDirectory, markers: &MarkerFiles, force: bool) -> Result<RowId> {
    let id = match read_marker(&job_dir.path, &markers.queue) {
        Ok(id) => id,
        Err(err @ MarkerError::Read { .. }) if !markers.is_consistent() && job_dir.path.join(&markers.job).exists() => {
            let job = &markers.job;
            warn!("Found {job} but not {} in {}", markers.queue, job_dir.path.display());
            bail!("{err}. This directory has a job marker named {job:?} instead; pass --queue-marker {job:?} if that is the one to use");
        }
        Err(err) => return Err(err.into()),
    };

    match force {
        true => force_transition(conn, id, JobState::Queued)?,
        false => transition(conn, id, JobState::Queued)?,
    }
    info!("Row {id} queued");
    Ok(id)
}
