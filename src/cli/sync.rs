//! tdsync sync command implementation
//!
//! Runs a full categorization and records its outcome: new correlations,
//! content updates, and completions are appended to the correlation log,
//! and policy decisions are appended to the resolution audit log.
//!
//! Unresolved true conflicts abort the run before anything is persisted,
//! unless `--allow-conflicts` is passed.

use std::path::Path;

use tracing::info;

use crate::categorize::{absorb_changeset, categorize};
use crate::changeset::ChangeSet;
use crate::cli::{load_run_inputs, plan};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::events_between;

#[derive(serde::Serialize)]
struct SyncReport {
    total: usize,
    conflicts: usize,
    potential_renames: usize,
    events_recorded: usize,
    resolutions_recorded: usize,
    changeset: ChangeSet,
}

pub fn run(
    root: &Path,
    todo: Option<&Path>,
    remote: Option<&Path>,
    allow_conflicts: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mut inputs = load_run_inputs(root, todo, remote)?;
    let options = inputs.options(false);

    let before = inputs.store.clone();
    let set = categorize(
        &inputs.local,
        &inputs.remote,
        &mut inputs.store,
        inputs.policy.as_ref(),
        &options,
    )?;

    if !set.conflicts.is_empty() && !allow_conflicts {
        return Err(Error::UnresolvedConflicts(set.conflicts.len()));
    }

    absorb_changeset(&mut inputs.store, &set);

    let events = events_between(&before, &inputs.store);
    let resolutions = inputs.store.take_resolutions();

    inputs.storage.append_events(&events)?;
    inputs.storage.append_resolutions(&resolutions)?;

    info!(
        changes = set.total(),
        events = events.len(),
        resolutions = resolutions.len(),
        "sync recorded"
    );

    let mut human = HumanOutput::new(format!("tdsync sync: {} change(s)", set.total()));
    plan::summarize(&mut human, &set);
    human.push_summary("events recorded", events.len().to_string());
    if !resolutions.is_empty() {
        human.push_summary("policy decisions", resolutions.len().to_string());
    }
    if set.is_empty() {
        human.push_detail("both sides are in sync".to_string());
    }
    if !set.conflicts.is_empty() {
        human.push_next_step("resolve the conflicts above, then run tdsync sync again");
    }

    let report = SyncReport {
        total: set.total(),
        conflicts: set.conflicts.len(),
        potential_renames: set.potential_renames.len(),
        events_recorded: events.len(),
        resolutions_recorded: resolutions.len(),
        changeset: set,
    };

    emit_success(OutputOptions { json, quiet }, "sync", &report, Some(&human))?;
    Ok(())
}
