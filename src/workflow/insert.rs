use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use jsonschema::JSONSchema;
use log::{info, warn};
use rusqlite::Connection;
use serde_json::Value;
use thiserror::Error;

use crate::db::ingest::system::ingest_system;
use crate::db::RowId;
use crate::structure::schema::{load_schema, validate, SchemaError};
use crate::structure::{StructureError, SystemRecord};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("can't read file: {0}")]
    Read(#[from] std::io::Error),
    #[error("not JSON: {0}")]
    Decode(serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("can't deserialise system: {0}")]
    Deserialise(serde_json::Error),
    #[error("invalid structure: {0}")]
    Structure(#[from] StructureError),
}

#[derive(Debug, Default)]
pub struct InsertReport {
    pub inserted: Vec<(PathBuf, RowId)>,
    pub rejected: Vec<(PathBuf, IngestError)>,
}

/// Validate each system file and add the valid ones as new rows
///
/// Invalid files are reported and skipped. Database errors abort the whole run.
pub fn insert(conn: &Connection, paths: &[PathBuf]) -> Result<InsertReport> {
    let schema = load_schema()?;
    let mut report = InsertReport::default();

    for path in paths {
        match read_system(&schema, path) {
            Ok(record) => {
                let id = ingest_system(conn, &record)?;
                report.inserted.push((path.clone(), id));
            }
            Err(err) => {
                warn!("Skipping {}: {err}", path.display());
                report.rejected.push((path.clone(), err));
            }
        }
    }

    info!("Inserted {} systems, rejected {}", report.inserted.len(), report.rejected.len());
    Ok(report)
}

fn read_system(schema: &JSONSchema, path: &Path) -> Result<SystemRecord, IngestError> {
    info!("Reading system at {}", path.display());
    let json_string = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&json_string).map_err(IngestError::Decode)?;
    validate(schema, &json)?;
    let record: SystemRecord = serde_json::from_value(json).map_err(IngestError::Deserialise)?;
    record.structure.validate()?;
    Ok(record)
}
