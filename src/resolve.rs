//! Conflict resolution policies.
//!
//! The categorizer invokes a policy at exactly one decision point: a
//! priority mismatch found during exact cross-matching. Policies are
//! swappable without touching the categorization algorithm.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Outcome of a policy decision for a priority mismatch.
///
/// Priorities are in the local scale; `None` is the unknown sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityDecision {
    pub winner: Option<u8>,
    pub loser: Option<u8>,
    pub policy: &'static str,
}

/// A deterministic rule deciding which side wins a divergence.
pub trait ConflictPolicy {
    fn name(&self) -> &'static str;

    /// Decide between a local task's literal priority and a remote task's
    /// priority mapped to the local scale.
    fn resolve_priority(&self, local: Option<u8>, remote_mapped: Option<u8>) -> PriorityDecision;
}

/// The local side always wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWins;

impl ConflictPolicy for LocalWins {
    fn name(&self) -> &'static str {
        "local-wins"
    }

    fn resolve_priority(&self, local: Option<u8>, remote_mapped: Option<u8>) -> PriorityDecision {
        PriorityDecision {
            winner: local,
            loser: remote_mapped,
            policy: self.name(),
        }
    }
}

/// The remote side always wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteWins;

impl ConflictPolicy for RemoteWins {
    fn name(&self) -> &'static str {
        "remote-wins"
    }

    fn resolve_priority(&self, local: Option<u8>, remote_mapped: Option<u8>) -> PriorityDecision {
        PriorityDecision {
            winner: remote_mapped,
            loser: local,
            policy: self.name(),
        }
    }
}

/// Config-selectable policy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    LocalWins,
    RemoteWins,
}

impl PolicyKind {
    pub fn policy(self) -> Box<dyn ConflictPolicy> {
        match self {
            PolicyKind::LocalWins => Box::new(LocalWins),
            PolicyKind::RemoteWins => Box::new(RemoteWins),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::LocalWins => "local-wins",
            PolicyKind::RemoteWins => "remote-wins",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "local-wins" => Ok(PolicyKind::LocalWins),
            "remote-wins" => Ok(PolicyKind::RemoteWins),
            other => Err(Error::InvalidConfig(format!(
                "unknown conflict policy {other:?} (expected local-wins or remote-wins)"
            ))),
        }
    }
}
