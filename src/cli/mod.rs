//! Command-line interface for tdsync
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod init;
mod plan;
mod status;
mod sync;

/// tdsync - todo file <-> remote project synchronizer
///
/// Diffs a plain-text todo file against a remote project snapshot,
/// correlates tasks across the two systems, and categorizes every change
/// into creations, completions, renames, and conflicts.
#[derive(Parser, Debug)]
#[command(name = "tdsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Sync root directory (defaults to current directory)
    #[arg(long, global = true, env = "TDSYNC_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize tdsync state in a directory
    Init,

    /// Preview the change-set without touching any state
    Plan {
        /// Todo file path (overrides config)
        #[arg(long)]
        todo: Option<PathBuf>,

        /// Remote snapshot path (overrides config)
        #[arg(long)]
        remote: Option<PathBuf>,
    },

    /// Categorize and record the change-set in the correlation log
    Sync {
        /// Todo file path (overrides config)
        #[arg(long)]
        todo: Option<PathBuf>,

        /// Remote snapshot path (overrides config)
        #[arg(long)]
        remote: Option<PathBuf>,

        /// Proceed even when true conflicts are present
        #[arg(long)]
        allow_conflicts: bool,
    },

    /// Show correlation store summary
    Status,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let root = sync_root(self.dir.clone())?;
        match self.command {
            Commands::Init => init::run(&root, self.json, self.quiet),
            Commands::Plan { ref todo, ref remote } => plan::run(
                &root,
                todo.as_deref(),
                remote.as_deref(),
                self.json,
                self.quiet,
            ),
            Commands::Sync {
                ref todo,
                ref remote,
                allow_conflicts,
            } => sync::run(
                &root,
                todo.as_deref(),
                remote.as_deref(),
                allow_conflicts,
                self.json,
                self.quiet,
            ),
            Commands::Status => status::run(&root, self.json, self.quiet),
        }
    }
}

fn sync_root(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Resolve a config-relative path against the sync root, keeping absolute
/// paths and explicit overrides as given.
pub(crate) fn resolve_path(
    root: &std::path::Path,
    configured: &std::path::Path,
    flag: Option<&std::path::Path>,
) -> PathBuf {
    let chosen = flag.unwrap_or(configured);
    if chosen.is_absolute() {
        chosen.to_path_buf()
    } else {
        root.join(chosen)
    }
}

/// Everything a categorization run needs, loaded from disk.
pub(crate) struct RunInputs {
    pub config: crate::config::Config,
    pub local: crate::task::TaskSet,
    pub remote: crate::task::TaskSet,
    pub storage: crate::storage::Storage,
    pub store: crate::correlation::CorrelationStore,
    pub policy: Box<dyn crate::resolve::ConflictPolicy>,
}

impl RunInputs {
    pub fn options(&self, preview: bool) -> crate::categorize::CategorizeOptions {
        crate::categorize::CategorizeOptions {
            preview,
            similarity_threshold: self.config.matching.similarity_threshold,
            completed_window_days: self.config.matching.completed_window_days,
            now: chrono::Utc::now(),
        }
    }
}

pub(crate) fn load_run_inputs(
    root: &std::path::Path,
    todo_flag: Option<&std::path::Path>,
    remote_flag: Option<&std::path::Path>,
) -> Result<RunInputs> {
    let storage = crate::storage::Storage::new(root);
    storage.require_initialized()?;

    let config = crate::config::Config::load_from_dir(root)?;
    let todo_path = resolve_path(root, &config.todo_file, todo_flag);
    let remote_path = resolve_path(root, &config.remote_snapshot, remote_flag);

    let local = crate::localfile::load(&todo_path)?;
    let remote = crate::snapshot::load(&remote_path)?;
    let store = storage.load_store()?;
    let policy = config.policy_kind()?.policy();

    Ok(RunInputs {
        config,
        local,
        remote,
        storage,
        store,
        policy,
    })
}
