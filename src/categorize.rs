//! Change categorization: the core diff/merge engine.
//!
//! Given fully-materialized snapshots of the local and remote task
//! collections plus the correlation store, `categorize` partitions every
//! observed delta into the change-set buckets. It is a pure function over
//! its inputs apart from explicit store mutations (fresh correlations,
//! buffered resolution records); it performs no I/O.
//!
//! Six passes, in order:
//! 1. correlated local current tasks (conflict / rename / unchanged)
//! 2. collect uncorrelated remote current tasks
//! 3. exact cross-match (priority reconciliation, already-synced absorption)
//! 4. fuzzy match of the remainder (potential renames vs. creations)
//! 5. local completed tasks
//! 6. remote completed tasks, restricted to the trailing completion window

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::changeset::{ChangeSet, CompleteItem, Conflict, NewItem, PotentialRename, Rename, RenameKind};
use crate::checksum;
use crate::correlation::{generate_correlation_id, Correlation, CorrelationStore};
use crate::error::Result;
use crate::marker;
use crate::priority;
use crate::resolve::ConflictPolicy;
use crate::task::{Source, Task, TaskSet};

/// Minimum cleaned-up content length for completed-pass entries.
const MIN_COMPLETED_CONTENT_LEN: usize = 3;

/// Knobs for a categorization run.
#[derive(Debug, Clone)]
pub struct CategorizeOptions {
    /// Preview runs suppress side-effecting resolution logging.
    pub preview: bool,
    /// Acceptance threshold for fuzzy content matching.
    pub similarity_threshold: f64,
    /// Remote completions older than this many days are ignored entirely.
    pub completed_window_days: i64,
    /// Injected clock; due-date escalation and the completion window both
    /// derive from it.
    pub now: DateTime<Utc>,
}

impl Default for CategorizeOptions {
    fn default() -> Self {
        Self {
            preview: false,
            similarity_threshold: checksum::DEFAULT_SIMILARITY_THRESHOLD,
            completed_window_days: 30,
            now: Utc::now(),
        }
    }
}

/// Categorize all deltas between the two sides into a change-set.
///
/// The store is mutated explicitly: fresh correlations are established for
/// exact cross-matches (including the already-synced case, so repeated runs
/// converge) and policy decisions are buffered via `log_resolution` unless
/// previewing. Applying the change-set back to the store is the caller's
/// step, after the apply collaborators have acted on it.
pub fn categorize(
    local: &TaskSet,
    remote: &TaskSet,
    store: &mut CorrelationStore,
    policy: &dyn ConflictPolicy,
    opts: &CategorizeOptions,
) -> Result<ChangeSet> {
    local.validate(Source::Local)?;
    remote.validate(Source::Remote)?;

    let today = opts.now.date_naive();
    let mut set = ChangeSet::default();

    let remote_by_id: HashMap<&str, &Task> = remote
        .current
        .iter()
        .filter_map(|task| task.remote_id.as_deref().map(|id| (id, task)))
        .collect();

    let mut processed_remote_ids: HashSet<String> = HashSet::new();

    // Pass 1: local current tasks with a recoverable correlation.
    let mut uncorrelated_local: Vec<(&Task, String)> = Vec::new();

    for task in &local.current {
        let stripped = marker::strip(&task.content);
        let embedded = marker::extract(&task.content);

        let live = embedded.as_ref().and_then(|id| {
            let corr = store.get(id)?;
            let remote_task = remote_by_id.get(corr.remote_id.as_str())?;
            Some((corr.clone(), *remote_task))
        });

        match live {
            Some((corr, remote_task)) => {
                let remote_stripped = marker::strip(&remote_task.content);
                let local_changed =
                    checksum::checksum(&stripped) != corr.local_checksum;
                let remote_changed =
                    checksum::checksum(&remote_stripped) != corr.remote_checksum;

                if local_changed && remote_changed {
                    let mut local_snapshot = task.clone();
                    local_snapshot.content = stripped.clone();
                    set.conflicts.push(Conflict {
                        correlation_id: corr.id.clone(),
                        local: local_snapshot,
                        remote: remote_task.clone(),
                        correlation: corr.clone(),
                    });
                } else if local_changed {
                    set.remote.renames.push(Rename::content(
                        corr.remote_content.clone(),
                        stripped.clone(),
                        Some(corr.remote_id.clone()),
                        corr.id.clone(),
                    ));
                } else if remote_changed {
                    set.local.renames.push(Rename::content(
                        corr.local_content.clone(),
                        remote_stripped,
                        Some(corr.remote_id.clone()),
                        corr.id.clone(),
                    ));
                }

                processed_remote_ids.insert(corr.remote_id.clone());
            }
            None => {
                // No marker, unknown id, or a dangling correlation whose
                // remote task vanished out-of-band. All fall back to
                // uncorrelated handling.
                uncorrelated_local.push((task, stripped));
            }
        }
    }

    // Pass 2: remote current tasks not claimed by a processed correlation.
    let mut available_remote: Vec<&Task> = remote
        .current
        .iter()
        .filter(|task| {
            task.remote_id
                .as_deref()
                .map(|id| !processed_remote_ids.contains(id))
                .unwrap_or(true)
        })
        .collect();

    debug!(
        uncorrelated_local = uncorrelated_local.len(),
        uncorrelated_remote = available_remote.len(),
        "correlation passes done"
    );

    // Pass 3: exact cross-match (case-insensitive, whitespace-trimmed).
    let mut unmatched_local: Vec<(&Task, String)> = Vec::new();

    for (task, stripped) in uncorrelated_local {
        let norm = normalize(&stripped);
        let found = available_remote
            .iter()
            .position(|rt| normalize(&marker::strip(&rt.content)) == norm);

        let Some(index) = found else {
            unmatched_local.push((task, stripped));
            continue;
        };

        let remote_task = available_remote.remove(index);
        let remote_stripped = marker::strip(&remote_task.content);
        let mapped = priority::remote_task_to_local(remote_task, today);

        if priority::priorities_match(task.priority, mapped) {
            // Already synced. Re-establish the correlation if the store has
            // drifted, so the pair is recognized in pass 1 next run instead
            // of being fuzzy-matched again.
            let known = remote_task
                .remote_id
                .as_deref()
                .and_then(|id| store.find_by_remote_id(id))
                .is_some();
            if !known {
                if let Some(remote_id) = remote_task.remote_id.as_deref() {
                    let corr_id = generate_correlation_id(&stripped);
                    store.insert(Correlation::new(
                        corr_id,
                        remote_id,
                        stripped.clone(),
                        remote_stripped,
                    ));
                }
            }
            continue;
        }

        // Priority mismatch: one well-defined policy decision point.
        let decision = policy.resolve_priority(task.priority, mapped);
        if !opts.preview {
            store.log_resolution(&stripped, decision.loser, decision.winner, decision.policy);
        }

        // Reuse a known correlation for this remote task so repeated runs
        // before the apply step never accumulate duplicates. A remote task
        // without an id has nothing to correlate against; the update is
        // still surfaced.
        let corr_id = remote_task.remote_id.as_deref().map(|remote_id| {
            match store.find_by_remote_id(remote_id) {
                Some(existing) => existing.id.clone(),
                None => {
                    let fresh = generate_correlation_id(&stripped);
                    store.insert(Correlation::new(
                        fresh.clone(),
                        remote_id,
                        stripped.clone(),
                        remote_stripped,
                    ));
                    fresh
                }
            }
        });

        let update = Rename {
            kind: RenameKind::PriorityUpdate,
            old_content: stripped.clone(),
            new_content: stripped.clone(),
            remote_id: remote_task.remote_id.clone(),
            correlation_id: corr_id,
            old_priority: decision.loser,
            new_priority: decision.winner,
            decided_by: Some(decision.policy.to_string()),
        };
        if decision.winner == task.priority {
            set.remote.renames.push(update);
        } else {
            set.local.renames.push(update);
        }
    }

    // Pass 4: fuzzy-match the remainder; misses become creations.
    for (task, stripped) in unmatched_local {
        match store.find_by_content_similarity(&stripped, opts.similarity_threshold) {
            Some(hit) => set.potential_renames.push(PotentialRename {
                content: stripped,
                side: Source::Local,
                correlation: hit.correlation,
                similarity: hit.similarity,
            }),
            None => set.remote.new_to_current.push(NewItem {
                content: stripped,
                priority: task.priority.map(priority::local_to_remote),
                due: task.due.clone(),
                completed_at: None,
            }),
        }
    }

    for remote_task in available_remote {
        let content = marker::strip(&remote_task.content);
        match store.find_by_content_similarity(&content, opts.similarity_threshold) {
            Some(hit) => set.potential_renames.push(PotentialRename {
                content,
                side: Source::Remote,
                correlation: hit.correlation,
                similarity: hit.similarity,
            }),
            None => set.local.new_to_current.push(NewItem {
                content,
                priority: priority::remote_task_to_local(remote_task, today),
                due: remote_task.due.clone(),
                completed_at: None,
            }),
        }
    }

    // Pass 5: locally completed tasks.
    let remote_completed_norms: HashSet<String> = remote
        .completed
        .iter()
        .filter_map(|task| clean_completed(&marker::strip(&task.content)))
        .collect();

    let mut seen_local_completed: HashSet<String> = HashSet::new();
    for task in &local.completed {
        let stripped = marker::strip(&task.content);
        let Some(norm) = clean_completed(&stripped) else {
            continue;
        };
        if !seen_local_completed.insert(norm.clone()) {
            continue;
        }

        let correlation = marker::extract(&task.content)
            .and_then(|id| store.get(&id).cloned());

        match correlation {
            None => {
                if !remote_completed_norms.contains(&norm) {
                    set.remote.new_to_completed.push(NewItem {
                        content: stripped,
                        priority: task.priority.map(priority::local_to_remote),
                        due: None,
                        completed_at: task.completed_at,
                    });
                }
            }
            Some(corr) if corr.is_current() => {
                set.remote.current_to_completed.push(CompleteItem {
                    content: stripped,
                    correlation_id: corr.id,
                    remote_id: Some(corr.remote_id),
                    priority: task.priority.map(priority::local_to_remote),
                    completed_at: task.completed_at,
                });
            }
            Some(_) => {} // already reconciled
        }
    }

    // Pass 6: remote completions within the trailing window.
    let window = Duration::days(opts.completed_window_days);
    let local_completed_norms: HashSet<String> = local
        .completed
        .iter()
        .filter_map(|task| clean_completed(&marker::strip(&task.content)))
        .collect();

    let mut seen_remote_completed: HashSet<String> = HashSet::new();
    for task in &remote.completed {
        let Some(completed_at) = task.completed_at else {
            // No timestamp means the window cannot be checked; skip rather
            // than resurrect arbitrarily old completions.
            continue;
        };
        if opts.now.signed_duration_since(completed_at) > window {
            continue;
        }

        let content = marker::strip(&task.content);
        let Some(norm) = clean_completed(&content) else {
            continue;
        };
        if !seen_remote_completed.insert(norm.clone()) {
            continue;
        }

        let mapped = priority::remote_task_to_local(task, today);
        let correlation = task
            .remote_id
            .as_deref()
            .and_then(|id| store.find_by_remote_id(id))
            .cloned();

        match correlation {
            None => {
                if !local_completed_norms.contains(&norm) {
                    set.local.new_to_completed.push(NewItem {
                        content,
                        priority: mapped,
                        due: None,
                        completed_at: Some(completed_at),
                    });
                }
            }
            Some(corr) if corr.is_current() => {
                set.local.current_to_completed.push(CompleteItem {
                    content,
                    correlation_id: corr.id,
                    remote_id: task.remote_id.clone(),
                    priority: mapped,
                    completed_at: Some(completed_at),
                });
            }
            Some(_) => {}
        }
    }

    debug!(
        total = set.total(),
        conflicts = set.conflicts.len(),
        potential_renames = set.potential_renames.len(),
        "categorization complete"
    );

    Ok(set)
}

/// Fold an applied change-set back into the correlation store.
///
/// After the apply collaborators have acted on a change-set, the store's
/// last-seen contents and statuses must catch up: content renames leave both
/// sides agreeing on the new text, and completions flip the correlation
/// status. Conflicts and potential renames are untouched; they carry no
/// applied outcome.
pub fn absorb_changeset(store: &mut CorrelationStore, set: &ChangeSet) {
    let renames = set.remote.renames.iter().chain(set.local.renames.iter());
    for rename in renames {
        if rename.kind != RenameKind::Content {
            continue;
        }
        let Some(id) = rename.correlation_id.as_deref() else {
            continue;
        };
        if let Some(correlation) = store.get_mut(id) {
            correlation
                .update_contents(rename.new_content.clone(), rename.new_content.clone());
        }
    }

    let completions = set
        .remote
        .current_to_completed
        .iter()
        .chain(set.local.current_to_completed.iter());
    for item in completions {
        if let Some(correlation) = store.get_mut(&item.correlation_id) {
            correlation.mark_completed();
        }
    }
}

fn normalize(content: &str) -> String {
    content.trim().to_lowercase()
}

/// Normalize a completed-pass entry, discarding degenerate content.
///
/// Returns `None` for empty, separator-only, or too-short entries.
fn clean_completed(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let separator_only = trimmed
        .chars()
        .all(|c| matches!(c, '-' | '=' | '_' | '*' | '#' | '~') || c.is_whitespace());
    if separator_only {
        return None;
    }
    if trimmed.chars().count() < MIN_COMPLETED_CONTENT_LEN {
        return None;
    }
    Some(trimmed.to_lowercase())
}
