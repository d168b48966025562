use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

use crate::config::{MarkerFiles, RUN_SCRIPT, SHARED_SCRIPT_TARGET};
use crate::db::job::load::select_ids;
use crate::db::job::state::JobState;
use crate::db::RowId;
use crate::workflow::marker::write_marker;
use crate::WorkingDirectory;

/// What `prepare` selects and where it puts the job directories
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub base: WorkingDirectory,
    /// Rows in any of these states get a directory
    pub states: Vec<JobState>,
    /// Link target of `run.sh` inside each job directory
    pub script_target: String,
    pub markers: MarkerFiles,
}

impl ProvisionOptions {
    pub fn new(base: WorkingDirectory) -> Self {
        ProvisionOptions {
            base,
            states: vec![JobState::NotQueued],
            script_target: SHARED_SCRIPT_TARGET.to_string(),
            markers: MarkerFiles::default(),
        }
    }
}

/// Job directories touched by one `prepare` run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<RowId>,
    pub kept: Vec<RowId>,
}

/// Make sure every selected row has a job directory with a marker and a script link
///
/// Existing directories are kept. Rows are not modified.
pub fn provision(conn: &Connection, options: &ProvisionOptions) -> Result<ProvisionReport> {
    let mut report = ProvisionReport::default();

    for id in select_ids(conn, &options.states)? {
        let job = options.base.job(id);
        let created = create_job_dir(&job.path)
            .with_context(|| format!("Can't create job directory {}", job.path.display()))?;
        if created {
            report.created.push(id);
        } else {
            report.kept.push(id);
        }

        link_script(&job.path, &options.script_target)
            .with_context(|| format!("Can't link {RUN_SCRIPT} in {}", job.path.display()))?;
        write_marker(&job.path, &options.markers.job, id)
            .with_context(|| format!("Can't write {} in {}", options.markers.job, job.path.display()))?;
    }

    info!("Created {} job directories, kept {}", report.created.len(), report.kept.len());
    Ok(report)
}

/// Returns false if the directory was already there
fn create_job_dir(path: &Path) -> io::Result<bool> {
    match fs::create_dir(path) {
        Ok(()) => {
            info!("Creating folder {}", path.display());
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            info!("Keeping folder {}", path.display());
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Link `dir/run.sh` to `target`; an existing link is left alone
fn link_script(dir: &Path, target: &str) -> io::Result<()> {
    let link = dir.join(RUN_SCRIPT);
    match symlink(target, &link) {
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            debug!("{} already exists, not linking", link.display());
            Ok(())
        }
        result => result,
    }
}

#[cfg(unix)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
