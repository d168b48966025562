use std::path::Path;
use std::time::Duration;

use log::info;
use rusqlite::Connection;

use crate::db::StoreResult;

static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));

pub fn open_db(path: &Path) -> StoreResult<Connection> {
    if !path.exists() {
        info!("Creating new database {}", path.display());
    }
    let conn = Connection::open(path)?;
    bootstrap(&conn)?;
    Ok(conn)
}

pub fn open_db_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    bootstrap(&conn)?;
    Ok(conn)
}

fn bootstrap(conn: &Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Writes after this point can be thrown away with [`release_or_rollback`]
pub fn begin_dry_run(conn: &Connection) -> StoreResult<()> {
    info!("Creating dry run save point");
    conn.execute_batch("SAVEPOINT dry_run")?;
    Ok(())
}

pub fn release_or_rollback(conn: &Connection, dry_run: bool) -> StoreResult<()> {
    match dry_run {
        true => {
            info!("--dry-run set, rolling back database state");
            conn.execute_batch("ROLLBACK TO dry_run; RELEASE dry_run")?;
        }
        false => {
            info!("--dry-run not set, releasing dry run save point");
            conn.execute_batch("RELEASE dry_run")?;
        }
    }
    Ok(())
}
