//! Load the submission script template and render it

/// Render `run.sh`, the script every job directory links to
pub mod script;
