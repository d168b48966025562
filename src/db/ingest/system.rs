use log::info;
use rusqlite::{params, Connection};

use crate::db::{now, RowId, StoreResult};
use crate::structure::SystemRecord;

/// Load a SystemRecord into a database
///
/// New rows start as `not_queued`, so the next `prepare` picks them up. Returns the id assigned by
/// the store.
pub fn ingest_system(conn: &Connection, record: &SystemRecord) -> StoreResult<RowId> {
    let structure = serde_json::to_string(&record.structure)?;
    let calculator = record.calculator.as_ref().map(serde_json::to_string).transpose()?;
    let timestamp = now();

    conn.execute(
        "INSERT INTO systems (structure, calculator, ctime, mtime) VALUES (?1, ?2, ?3, ?3)",
        params![structure, calculator, timestamp],
    )?;
    let id = conn.last_insert_rowid();
    info!("Added {} as row {id}", record.structure.formula());
    Ok(id)
}
