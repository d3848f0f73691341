//! tdsync plan command implementation
//!
//! Runs a preview categorization: the full change-set is computed and
//! printed, but nothing is persisted and no resolution decisions are logged.

use std::path::Path;

use crate::categorize::categorize;
use crate::changeset::ChangeSet;
use crate::cli::load_run_inputs;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(serde::Serialize)]
struct PlanReport {
    total: usize,
    conflicts: usize,
    potential_renames: usize,
    changeset: ChangeSet,
}

pub fn run(
    root: &Path,
    todo: Option<&Path>,
    remote: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mut inputs = load_run_inputs(root, todo, remote)?;
    let options = inputs.options(true);

    let set = categorize(
        &inputs.local,
        &inputs.remote,
        &mut inputs.store,
        inputs.policy.as_ref(),
        &options,
    )?;

    let mut human = HumanOutput::new(format!("tdsync plan: {} change(s)", set.total()));
    summarize(&mut human, &set);
    if set.is_empty() {
        human.push_detail("both sides are in sync".to_string());
    } else {
        human.push_next_step("tdsync sync".to_string());
    }

    let report = PlanReport {
        total: set.total(),
        conflicts: set.conflicts.len(),
        potential_renames: set.potential_renames.len(),
        changeset: set,
    };

    emit_success(OutputOptions { json, quiet }, "plan", &report, Some(&human))?;
    Ok(())
}

pub(crate) fn summarize(human: &mut HumanOutput, set: &ChangeSet) {
    let completions = set.remote.current_to_completed.len()
        + set.local.current_to_completed.len()
        + set.remote.new_to_completed.len()
        + set.local.new_to_completed.len();

    human.push_summary(
        "remote-bound creations",
        set.remote.new_to_current.len().to_string(),
    );
    human.push_summary(
        "local-bound creations",
        set.local.new_to_current.len().to_string(),
    );
    human.push_summary("completions", completions.to_string());
    human.push_summary(
        "renames",
        (set.remote.renames.len() + set.local.renames.len()).to_string(),
    );
    human.push_summary("conflicts", set.conflicts.len().to_string());

    for item in &set.remote.new_to_current {
        human.push_detail(format!("create on remote: {}", item.content));
    }
    for item in &set.local.new_to_current {
        human.push_detail(format!("create locally: {}", item.content));
    }
    for rename in &set.remote.renames {
        human.push_detail(format!(
            "update remote: {} -> {}",
            rename.old_content, rename.new_content
        ));
    }
    for rename in &set.local.renames {
        human.push_detail(format!(
            "update local: {} -> {}",
            rename.old_content, rename.new_content
        ));
    }
    for conflict in &set.conflicts {
        human.push_warning(format!(
            "conflict on {}: local {:?} vs remote {:?}",
            conflict.correlation_id, conflict.local.content, conflict.remote.content
        ));
    }
    for candidate in &set.potential_renames {
        human.push_warning(format!(
            "possible rename ({:.0}% similar): {:?} ~ correlation {}",
            candidate.similarity * 100.0,
            candidate.content,
            candidate.correlation.id
        ));
    }
}
