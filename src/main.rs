use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use relaxq::config::{Config, MarkerFiles, DEFAULT_JOB_MARKER, DEFAULT_QUEUE_MARKER, SHARED_SCRIPT_TARGET};
use relaxq::db::job::state::JobState;
use relaxq::db::open::{begin_dry_run, open_db, release_or_rollback};
use relaxq::slurm::script::{render_script, write_script, ScriptOptions};
use relaxq::workflow::provision::ProvisionOptions;
use relaxq::workflow::{insert, provision, queue, run, status};
use relaxq::WorkingDirectory;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive batched structure relaxations from a SQLite row store", long_about = None)]
struct Cli {
    /// File in each job directory that `prepare` writes and `run` reads
    #[arg(long, global = true, default_value = DEFAULT_JOB_MARKER)]
    job_marker: String,
    /// File in each job directory that `queue` reads
    #[arg(long, global = true, default_value = DEFAULT_QUEUE_MARKER)]
    queue_marker: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Store {
    /// Path to the row store
    #[arg(env = "RELAXQ_DB")]
    db: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a job directory for every row that isn't queued yet
    Prepare {
        #[command(flatten)]
        store: Store,
        /// Directory the job directories are created in
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
        /// Where each job directory's run.sh points
        #[arg(long, default_value = SHARED_SCRIPT_TARGET)]
        script: String,
        /// Select rows in these states instead
        #[arg(long = "state", value_enum, default_values_t = vec![JobState::NotQueued])]
        states: Vec<JobState>,
    },
    /// Relax the structure of the row named in the job directory
    Run {
        #[command(flatten)]
        store: Store,
        /// Job directory holding the job marker
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Mark the row named in the job directory as queued
    Queue {
        #[command(flatten)]
        store: Store,
        /// Job directory holding the queue marker
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Re-queue a row even if it is running
        #[arg(long)]
        force: bool,
        /// Roll back the update
        #[arg(long)]
        dry_run: bool,
    },
    /// Add structures from JSON files as new rows
    Insert {
        #[command(flatten)]
        store: Store,
        /// System files: {"structure": {...}, "calculator": {...}}
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Roll back the inserts
        #[arg(long)]
        dry_run: bool,
    },
    /// Render the shared SLURM submission script
    Script {
        #[command(flatten)]
        store: Store,
        /// Directory the script is written to
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
        #[arg(long, default_value = "relax")]
        job_name: String,
        #[arg(long)]
        partition: Option<String>,
        /// Wall time, HH:MM:SS
        #[arg(long, default_value = "01:00:00")]
        time: String,
        #[arg(long, default_value_t = 1)]
        ntasks: u32,
    },
    /// Count rows by job state
    Status {
        #[command(flatten)]
        store: Store,
    },
}

impl Command {
    fn store(&self) -> &Store {
        match self {
            Command::Prepare { store, .. }
            | Command::Run { store, .. }
            | Command::Queue { store, .. }
            | Command::Insert { store, .. }
            | Command::Script { store, .. }
            | Command::Status { store } => store,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("terve! starting up :)");

    let args = Cli::parse();
    let markers = MarkerFiles { job: args.job_marker.clone(), queue: args.queue_marker.clone() };
    let config = Config::new(&args.command.store().db).with_markers(markers);

    match args.command {
        Command::Prepare { base_dir, script, states, .. } => {
            let conn = open_db(&config.db_path)?;
            let options = ProvisionOptions {
                base: WorkingDirectory::new(base_dir),
                states,
                script_target: script,
                markers: config.markers,
            };
            let report = provision::provision(&conn, &options)?;
            println!("created {} kept {}", report.created.len(), report.kept.len());
        }
        Command::Run { dir, .. } => {
            let conn = open_db(&config.db_path)?;
            let energy = run::run(&conn, &WorkingDirectory::new(dir), &config.markers)?;
            println!("===========================================");
            println!("Relaxation completed: {energy} eV");
            println!("===========================================");
        }
        Command::Queue { dir, force, dry_run, .. } => {
            let conn = open_db(&config.db_path)?;
            begin_dry_run(&conn)?;
            let id = queue::queue(&conn, &WorkingDirectory::new(dir), &config.markers, force)?;
            release_or_rollback(&conn, dry_run)?;
            println!("queued {id}");
        }
        Command::Insert { files, dry_run, .. } => {
            let conn = open_db(&config.db_path)?;
            begin_dry_run(&conn)?;
            let report = insert::insert(&conn, &files)?;
            release_or_rollback(&conn, dry_run)?;
            for (path, id) in &report.inserted {
                println!("{id}\t{}", path.display());
            }
            if !report.rejected.is_empty() {
                bail!("{} of {} files were rejected", report.rejected.len(), files.len());
            }
        }
        Command::Script { base_dir, job_name, partition, time, ntasks, .. } => {
            let db_path = absolute(&config.db_path)?;
            let program = env::current_exe().context("Can't find own executable")?;
            let options = ScriptOptions { job_name, partition, time, ntasks, program, db_path };
            let content = render_script(&options).context("Can't render submission script")?;
            let path = write_script(&WorkingDirectory::new(base_dir), &content)?;
            println!("{}", path.display());
        }
        Command::Status { .. } => {
            let conn = open_db(&config.db_path)?;
            let report = status::status(&conn)?;
            for (state, n) in &report.counts {
                println!("{state:<12}{n}");
            }
            println!("{:<12}{}", "total", report.total());
            if !report.running.is_empty() {
                println!("running: {:?}", report.running);
            }
            if !report.failed.is_empty() {
                println!("failed: {:?}", report.failed);
            }
        }
    }

    Ok(())
}

/// The job script runs from the job directory, so the store path must not be relative
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Can't make {} absolute", path.display()))
}
