//! Drive batched structure relaxations on a SLURM cluster from a SQLite row store
//!
//! One row per structure. The `prepare`, `run` and `queue` procedures move rows through their job
//! lifecycle; see [`db::job::state::JobState`].

use std::path::PathBuf;

/// Marker file names and other shared configuration
pub mod config;
/// Atomic structure payloads stored on each row
pub mod structure;
/// External solvers that compute potential energies
pub mod calculator;
/// All job state is stored in a SQLite database
pub mod db;
/// Render the shared SLURM submission script
pub mod slurm;
/// The procedures exposed on the command line
pub mod workflow;

/// A directory that jobs are staged in, or run from
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    pub path: PathBuf,
}

impl WorkingDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WorkingDirectory { path: path.into() }
    }

    /// The job directory of a row, named by its decimal id
    pub fn job(&self, id: db::RowId) -> WorkingDirectory {
        WorkingDirectory { path: self.path.join(id.to_string()) }
    }
}
