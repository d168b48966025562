use log::info;
use rusqlite::{params, Connection};

use crate::db::job::load::get_state;
use crate::db::job::state::JobState;
use crate::db::{now, RowId, StoreError, StoreResult};
use crate::structure::Structure;

/// Move a row to `to` if its current state allows it
///
/// The check and the write happen in one `UPDATE`, so two jobs racing for the same row can't both
/// win.
pub fn transition(conn: &Connection, id: RowId, to: JobState) -> StoreResult<()> {
    info!("Updating {id} with state {to}");
    let sources = allowed_sources(to);
    if sources.is_empty() {
        return Err(illegal(conn, id, to));
    }
    let stmt = format!("UPDATE systems SET state = ?1, mtime = ?2 WHERE id = ?3 AND state IN ({sources})");
    let changed = conn.execute(&stmt, params![to, now(), id])?;
    match changed {
        0 => Err(illegal(conn, id, to)),
        _ => Ok(()),
    }
}

/// Move a row to `to` whatever state it is in
pub fn force_transition(conn: &Connection, id: RowId, to: JobState) -> StoreResult<()> {
    info!("Forcing {id} to state {to}");
    let changed = conn.execute(
        "UPDATE systems SET state = ?1, mtime = ?2 WHERE id = ?3",
        params![to, now(), id],
    )?;
    match changed {
        0 => Err(StoreError::NotFound(id)),
        _ => Ok(()),
    }
}

/// Store the final structure and energy of a running row and mark it converged
pub fn converge(conn: &Connection, id: RowId, structure: &Structure, energy: f64) -> StoreResult<()> {
    info!("Updating {id} with final structure, energy {energy} eV");
    let json = serde_json::to_string(structure)?;
    let to = JobState::Converged;
    let stmt = format!(
        "UPDATE systems SET state = ?1, structure = ?2, energy = ?3, mtime = ?4 WHERE id = ?5 AND state IN ({})",
        allowed_sources(to)
    );
    let changed = conn.execute(&stmt, params![to, json, energy, now(), id])?;
    match changed {
        0 => Err(illegal(conn, id, to)),
        _ => Ok(()),
    }
}

/// SQL list of the states a row may be in to move to `to`
///
/// State names are static, so they are inlined rather than bound.
fn allowed_sources(to: JobState) -> String {
    to.sources()
        .iter()
        .map(|state| format!("'{}'", state.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Explain why a conditional update touched nothing
fn illegal(conn: &Connection, id: RowId, to: JobState) -> StoreError {
    match get_state(conn, id) {
        Ok(from) => StoreError::IllegalTransition { id, from, to },
        Err(err) => err,
    }
}
