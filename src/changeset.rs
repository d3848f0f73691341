//! The categorizer's output: a partition of every observed delta into named
//! buckets, one half per apply direction, plus flat conflict and
//! potential-rename lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::correlation::Correlation;
use crate::task::{Due, Source, Task};

/// A task that must be created on the target side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewItem {
    pub content: String,

    /// Priority already mapped to the target side's scale; `None` is the
    /// "unknown" sentinel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A correlated task that must be marked completed on the target side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteItem {
    pub content: String,
    pub correlation_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// What kind of rename an entry represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RenameKind {
    /// Content changed on the other side.
    Content,
    /// Priority mismatch resolved by the conflict policy.
    PriorityUpdate,
}

/// A rename (or priority update) to apply on the target side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rename {
    pub kind: RenameKind,
    pub old_content: String,
    pub new_content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_priority: Option<u8>,

    /// Which policy decided the winning value, for priority updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl Rename {
    pub fn content(
        old_content: impl Into<String>,
        new_content: impl Into<String>,
        remote_id: Option<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: RenameKind::Content,
            old_content: old_content.into(),
            new_content: new_content.into(),
            remote_id,
            correlation_id: Some(correlation_id.into()),
            old_priority: None,
            new_priority: None,
            decided_by: None,
        }
    }
}

/// A correlated pair where both sides changed since the last sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    pub correlation_id: String,
    pub local: Task,
    pub remote: Task,
    pub correlation: Correlation,
}

/// A fuzzy-matched pairing that needs human confirmation before it is
/// applied as a rename. Never folded into the automatic buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialRename {
    pub content: String,
    /// Which side the unmatched task was observed on.
    pub side: Source,
    pub correlation: Correlation,
    pub similarity: f64,
}

/// The changes to apply to one side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectionChanges {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_to_current: Vec<NewItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_to_completed: Vec<NewItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_to_completed: Vec<CompleteItem>,

    /// Outright deletions. Kept in the change-set shape for apply
    /// collaborators; the categorizer treats missing-from-current as
    /// completed, not deleted, so it does not emit here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_to_none: Vec<Task>,

    /// Completed tasks returning to current. Same reservation as
    /// `current_to_none`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed_to_current: Vec<Task>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
}

impl DirectionChanges {
    pub fn is_empty(&self) -> bool {
        self.new_to_current.is_empty()
            && self.new_to_completed.is_empty()
            && self.current_to_completed.is_empty()
            && self.current_to_none.is_empty()
            && self.completed_to_current.is_empty()
            && self.renames.is_empty()
    }

    pub fn count(&self) -> usize {
        self.new_to_current.len()
            + self.new_to_completed.len()
            + self.current_to_completed.len()
            + self.current_to_none.len()
            + self.completed_to_current.len()
            + self.renames.len()
    }
}

/// Full categorization output for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    /// Changes to apply to the local todo file.
    pub local: DirectionChanges,

    /// Changes to apply to the remote project.
    pub remote: DirectionChanges,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub potential_renames: Vec<PotentialRename>,
}

impl ChangeSet {
    /// True when the run produced nothing to apply, ask, or resolve.
    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
            && self.remote.is_empty()
            && self.conflicts.is_empty()
            && self.potential_renames.is_empty()
    }

    /// Total entries across all buckets, conflicts, and candidates.
    pub fn total(&self) -> usize {
        self.local.count()
            + self.remote.count()
            + self.conflicts.len()
            + self.potential_renames.len()
    }
}
