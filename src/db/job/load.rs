use log::info;
use rusqlite::{params_from_iter, Connection, OptionalExtension};

use crate::calculator::CalculatorSpec;
use crate::db::job::state::JobState;
use crate::db::{RowId, StoreError, StoreResult};
use crate::structure::Structure;

/// A row of the `systems` table with its JSON columns deserialised
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: RowId,
    pub state: JobState,
    pub structure: Structure,
    pub calculator: Option<CalculatorSpec>,
    pub energy: Option<f64>,
    pub ctime: String,
    pub mtime: String,
}

impl JobRow {
    /// The attached calculator, required to run the row
    pub fn calculator(&self) -> StoreResult<&CalculatorSpec> {
        self.calculator.as_ref().ok_or(StoreError::NoCalculator(self.id))
    }
}

/// Ids of all rows in any of `states`, in insertion order
pub fn select_ids(conn: &Connection, states: &[JobState]) -> StoreResult<Vec<RowId>> {
    if states.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; states.len()].join(", ");
    let sql = format!("SELECT id FROM systems WHERE state IN ({placeholders}) ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(states.iter()), |row| row.get(0))?
        .collect::<Result<Vec<RowId>, rusqlite::Error>>()?;
    info!("Selected {} rows with state in {:?}", ids.len(), states);
    Ok(ids)
}

pub fn get_state(conn: &Connection, id: RowId) -> StoreResult<JobState> {
    conn.query_row("SELECT state FROM systems WHERE id = ?1", [id], |row| row.get(0))
        .optional()?
        .ok_or(StoreError::NotFound(id))
}

pub fn get_row(conn: &Connection, id: RowId) -> StoreResult<JobRow> {
    info!("Loading row {id} from db");
    let raw = conn
        .query_row(
            "SELECT state, structure, calculator, energy, ctime, mtime FROM systems WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, JobState>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or(StoreError::NotFound(id))?;

    let (state, structure, calculator, energy, ctime, mtime) = raw;
    let calculator = match calculator {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    };
    Ok(JobRow {
        id,
        state,
        structure: serde_json::from_str(&structure)?,
        calculator,
        energy,
        ctime,
        mtime,
    })
}

/// Number of rows in each state, zero counts included
pub fn count_by_state(conn: &Connection) -> StoreResult<Vec<(JobState, i64)>> {
    let mut stmt = conn.prepare("SELECT state, COUNT(*) FROM systems GROUP BY state")?;
    let counted = stmt
        .query_map([], |row| Ok((row.get::<_, JobState>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    Ok(JobState::ALL
        .iter()
        .map(|state| {
            let n = counted.iter().find(|(s, _)| s == state).map_or(0, |(_, n)| *n);
            (*state, n)
        })
        .collect())
}
