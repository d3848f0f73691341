//! Task records exchanged between the local file and remote snapshot
//! collaborators and the categorization engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which system a task snapshot was observed on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Local,
    Remote,
}

/// A due date in one of the three forms the remote side reports.
///
/// Comparison happens at day granularity; time-of-day is discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Due {
    /// Date-only field, e.g. `2026-08-27`.
    Date(NaiveDate),
    /// Full datetime field.
    Datetime(DateTime<Utc>),
    /// Raw string the remote did not structure; parsed best-effort.
    Raw(String),
}

impl Due {
    /// The calendar day this due date falls on, if it can be determined.
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            Due::Date(date) => Some(*date),
            Due::Datetime(dt) => Some(dt.date_naive()),
            Due::Raw(raw) => parse_raw_day(raw),
        }
    }
}

fn parse_raw_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    None
}

/// A unit of work on either side of the sync.
///
/// `content` is user-editable display text and may carry an embedded
/// correlation marker; comparisons always use the marker-stripped form.
/// Local priorities run 0 (most urgent) to 4; remote priorities run
/// 1 (lowest) to 4 (highest). A missing priority is the "unknown" sentinel
/// and never equals a numeric priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Subtasks are exclusively owned by their parent task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Task>,

    /// Display-only back-reference to the owning task's content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl Task {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            priority: None,
            remote_id: None,
            due: None,
            completed_at: None,
            subtasks: Vec::new(),
            parent_content: None,
            source: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = Some(remote_id.into());
        self
    }

    pub fn with_due(mut self, due: Due) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

/// Current and completed tasks from one side of the sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSet {
    #[serde(default)]
    pub current: Vec<Task>,
    #[serde(default)]
    pub completed: Vec<Task>,
}

impl TaskSet {
    pub fn new(current: Vec<Task>, completed: Vec<Task>) -> Self {
        Self { current, completed }
    }

    /// Reject structurally invalid snapshots before categorization.
    ///
    /// Partial categorization would corrupt the correlation store, so a
    /// single malformed record aborts the whole run.
    pub fn validate(&self, side: Source) -> Result<()> {
        for task in self.current.iter().chain(self.completed.iter()) {
            if task.content.trim().is_empty() {
                return Err(Error::MalformedTask(format!(
                    "{:?} task with empty content",
                    side
                )));
            }
            if let Some(priority) = task.priority {
                let valid = match side {
                    Source::Local => priority <= 4,
                    Source::Remote => (1..=4).contains(&priority),
                };
                if !valid {
                    return Err(Error::MalformedTask(format!(
                        "{:?} task {:?} has out-of-range priority {}",
                        side, task.content, priority
                    )));
                }
            }
        }
        Ok(())
    }
}
