//! tdsync status command implementation

use std::path::{Path, PathBuf};

use crate::cli::resolve_path;
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::Storage;

#[derive(serde::Serialize)]
struct StatusReport {
    root: PathBuf,
    todo_file: PathBuf,
    remote_snapshot: PathBuf,
    policy: String,
    correlations_current: usize,
    correlations_completed: usize,
    resolutions_recorded: usize,
}

pub fn run(root: &Path, json: bool, quiet: bool) -> Result<()> {
    let storage = Storage::new(root);
    storage.require_initialized()?;

    let config = Config::load_from_dir(root)?;
    let store = storage.load_store()?;
    let resolutions = storage.read_resolutions()?;

    let current = store.current().count();
    let completed = store.len() - current;

    let report = StatusReport {
        root: root.to_path_buf(),
        todo_file: resolve_path(root, &config.todo_file, None),
        remote_snapshot: resolve_path(root, &config.remote_snapshot, None),
        policy: config.resolve.policy.clone(),
        correlations_current: current,
        correlations_completed: completed,
        resolutions_recorded: resolutions.len(),
    };

    let mut human = HumanOutput::new("tdsync status");
    human.push_summary("root", root.display().to_string());
    human.push_summary("todo file", report.todo_file.display().to_string());
    human.push_summary(
        "remote snapshot",
        report.remote_snapshot.display().to_string(),
    );
    human.push_summary("conflict policy", report.policy.clone());
    human.push_summary("current correlations", current.to_string());
    human.push_summary("completed correlations", completed.to_string());
    human.push_summary("recorded resolutions", resolutions.len().to_string());

    emit_success(OutputOptions { json, quiet }, "status", &report, Some(&human))?;
    Ok(())
}
