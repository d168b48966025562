use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::db::RowId;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("can't read marker {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("marker {path} doesn't hold a row id: {content:?}")]
    Invalid { path: PathBuf, content: String },
}

/// Write `id` as decimal text to `dir/name`, replacing any previous content
pub fn write_marker(dir: &Path, name: &str, id: RowId) -> io::Result<()> {
    fs::write(dir.join(name), id.to_string())
}

/// Read the row id from `dir/name`, ignoring surrounding whitespace
pub fn read_marker(dir: &Path, name: &str) -> Result<RowId, MarkerError> {
    let path = dir.join(name);
    let content = fs::read_to_string(&path).map_err(|source| MarkerError::Read { path: path.clone(), source })?;
    let id = parse_id(content.trim()).ok_or_else(|| MarkerError::Invalid { path: path.clone(), content: content.clone() })?;
    info!("Read row id {id} from {}", path.display());
    Ok(id)
}

/// Row ids are integers, but markers written by hand sometimes hold `12.0`
fn parse_id(text: &str) -> Option<RowId> {
    if let Ok(id) = text.parse::<RowId>() {
        return Some(id);
    }
    let float = text.parse::<f64>().ok()?;
    if float.fract() == 0.0 && float.is_finite() && float.abs() < i64::MAX as f64 {
        Some(float as RowId)
    } else {
        None
    }
}
