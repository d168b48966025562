use std::path::PathBuf;

/// Marker written by `prepare` and read by `run`
pub const DEFAULT_JOB_MARKER: &str = "db_id";
/// Marker read by `queue`
///
/// Historically this differs from [`DEFAULT_JOB_MARKER`]. Both are configurable, and `queue` says
/// so when it finds the job marker but not its own.
pub const DEFAULT_QUEUE_MARKER: &str = "dbid";
/// Name of the submission script link inside each job directory
pub const RUN_SCRIPT: &str = "run.sh";
/// Where the job directory link points to
pub const SHARED_SCRIPT_TARGET: &str = "../run.sh";

/// Names of the files that carry a row id inside a job directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFiles {
    pub job: String,
    pub queue: String,
}

impl Default for MarkerFiles {
    fn default() -> Self {
        MarkerFiles {
            job: DEFAULT_JOB_MARKER.to_string(),
            queue: DEFAULT_QUEUE_MARKER.to_string(),
        }
    }
}

impl MarkerFiles {
    pub fn is_consistent(&self) -> bool {
        self.job == self.queue
    }
}

/// Configuration shared by every procedure
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite row store
    pub db_path: PathBuf,
    pub markers: MarkerFiles,
}

impl Config {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Config { db_path: db_path.into(), markers: MarkerFiles::default() }
    }

    pub fn with_markers(mut self, markers: MarkerFiles) -> Self {
        self.markers = markers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_markers_differ() {
        let markers = MarkerFiles::default();
        assert_eq!(markers.job, "db_id");
        assert_eq!(markers.queue, "dbid");
        assert!(!markers.is_consistent());
    }

    #[test]
    fn config_keeps_db_path() {
        let config = Config::new("/scratch/surfaces.db");
        assert_eq!(config.db_path, PathBuf::from("/scratch/surfaces.db"));
        assert_eq!(config.markers, MarkerFiles::default());
    }
}
