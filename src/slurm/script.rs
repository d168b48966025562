use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::config::RUN_SCRIPT;
use crate::WorkingDirectory;

/// SBATCH options and paths that go into the rendered script
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub job_name: String,
    /// Queue / partition, left to the cluster default when unset
    pub partition: Option<String>,
    /// Wall time, `HH:MM:SS`
    pub time: String,
    pub ntasks: u32,
    /// Executable the job calls back into
    pub program: PathBuf,
    /// Absolute path of the row store
    pub db_path: PathBuf,
}

/// Rendering context for the script
#[derive(Serialize)]
struct ScriptContext {
    job_name: String,
    partition: Option<String>,
    time: String,
    ntasks: u32,
    program: String,
    db_path: String,
    time_now: String,
}

/// Render the submission script using TinyTemplate
pub fn render_script(options: &ScriptOptions) -> Result<String, tinytemplate::error::Error> {
    /// included run script template
    static RUN: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/run.sh"));
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("run", RUN)?;

    let context = ScriptContext {
        job_name: options.job_name.clone(),
        partition: options.partition.clone(),
        time: options.time.clone(),
        ntasks: options.ntasks,
        program: options.program.display().to_string(),
        db_path: options.db_path.display().to_string(),
        time_now: Utc::now().to_rfc3339(),
    };
    tt.render("run", &context)
}

/// Write the rendered script to `wd/run.sh`, replacing any existing one
pub fn write_script(wd: &WorkingDirectory, content: &str) -> io::Result<PathBuf> {
    let out_path = wd.path.join(RUN_SCRIPT);
    if out_path.exists() {
        warn!("{} already exists and will be overwritten", out_path.display());
    }
    info!("Writing submission script to {}", out_path.display());
    fs::write(&out_path, content)?;
    make_executable(&out_path)?;
    Ok(out_path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
