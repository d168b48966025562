use anyhow::{Context, Result};
use log::{error, info};
use rusqlite::Connection;

use crate::calculator::Calculator;
use crate::config::MarkerFiles;
use crate::db::job::load::{get_row, JobRow};
use crate::db::job::state::JobState;
use crate::db::job::update::{converge, transition};
use crate::workflow::marker::read_marker;
use crate::WorkingDirectory;

/// Relax the row named by the job marker in `job_dir` with its attached calculator
///
/// Returns the final energy. The calculator runs inside `job_dir`.
pub fn run(conn: &Connection, job_dir: &WorkingDirectory, markers: &MarkerFiles) -> Result<f64> {
    let id = read_marker(&job_dir.path, &markers.job)?;
    let row = get_row(conn, id).with_context(|| format!("Can't load row {id}"))?;
    let mut calculator = row.calculator()?.attach(&job_dir.path);
    relax(conn, row, calculator.as_mut())
}

/// Mark `row` running, compute its energy, then store the result
///
/// A failing calculator leaves the row `failed` and its error is returned.
pub fn relax(conn: &Connection, row: JobRow, calculator: &mut dyn Calculator) -> Result<f64> {
    let id = row.id;
    transition(conn, id, JobState::Running).with_context(|| format!("Can't start row {id}"))?;

    let mut structure = row.structure;
    info!("Running {} on row {id} ({})", calculator.name(), structure.formula());
    match calculator.potential_energy(&mut structure) {
        Ok(energy) => {
            info!("Relaxation of row {id} completed, energy {energy} eV");
            converge(conn, id, &structure, energy).with_context(|| format!("Can't store result of row {id}"))?;
            Ok(energy)
        }
        Err(err) => {
            error!("Calculation of row {id} failed: {err}");
            transition(conn, id, JobState::Failed).with_context(|| format!("Can't mark row {id} failed"))?;
            Err(err).with_context(|| format!("Calculation of row {id} failed"))
        }
    }
}
