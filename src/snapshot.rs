//! Remote-side snapshot loading.
//!
//! The remote project is consumed from a pre-fetched JSON snapshot rather
//! than a live API client; fetching is an external collaborator's job and
//! happens before categorization, so the engine never observes a partial
//! view.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Due, Source, Task, TaskSet};

/// One task as the remote system reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub content: String,
    /// Remote scale: 1 (lowest) .. 4 (highest).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// The full remote snapshot: current and recently-completed tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    #[serde(default)]
    pub current: Vec<RemoteItem>,
    #[serde(default)]
    pub completed: Vec<RemoteItem>,
}

impl RemoteSnapshot {
    /// Convert into the normalized task-set shape the categorizer consumes.
    pub fn into_task_set(self) -> Result<TaskSet> {
        let current = self
            .current
            .into_iter()
            .map(item_to_task)
            .collect::<Result<Vec<_>>>()?;
        let completed = self
            .completed
            .into_iter()
            .map(item_to_task)
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskSet::new(current, completed))
    }
}

fn item_to_task(item: RemoteItem) -> Result<Task> {
    if item.id.trim().is_empty() {
        return Err(Error::MalformedSnapshot(format!(
            "remote task {:?} has an empty id",
            item.content
        )));
    }
    if item.content.trim().is_empty() {
        return Err(Error::MalformedSnapshot(format!(
            "remote task {} has empty content",
            item.id
        )));
    }

    let mut task = Task::new(item.content)
        .with_remote_id(item.id)
        .with_source(Source::Remote);
    task.priority = item.priority;
    task.due = item.due;
    task.completed_at = item.completed_at;
    Ok(task)
}

/// Load a remote snapshot file and normalize it.
pub fn load(path: &Path) -> Result<TaskSet> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let snapshot: RemoteSnapshot = serde_json::from_str(&text)?;
    snapshot.into_task_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_with_due_forms() {
        let json = r#"{
            "current": [
                {"id": "r-1", "content": "Buy milk", "priority": 2},
                {"id": "r-2", "content": "File taxes", "priority": 4,
                 "due": {"date": "2026-08-27"}}
            ],
            "completed": [
                {"id": "r-3", "content": "Ship the package",
                 "completed_at": "2026-08-20T10:00:00Z"}
            ]
        }"#;

        let snapshot: RemoteSnapshot = serde_json::from_str(json).expect("parse");
        let set = snapshot.into_task_set().expect("normalize");

        assert_eq!(set.current.len(), 2);
        assert_eq!(set.completed.len(), 1);
        assert_eq!(set.current[0].remote_id.as_deref(), Some("r-1"));
        assert_eq!(set.current[1].due.as_ref().and_then(Due::day).unwrap().to_string(), "2026-08-27");
        assert!(set.completed[0].completed_at.is_some());
    }

    #[test]
    fn rejects_empty_id() {
        let snapshot = RemoteSnapshot {
            current: vec![RemoteItem {
                id: " ".into(),
                content: "Buy milk".into(),
                priority: None,
                due: None,
                completed_at: None,
            }],
            completed: vec![],
        };
        assert!(snapshot.into_task_set().is_err());
    }

    #[test]
    fn rejects_empty_content() {
        let snapshot = RemoteSnapshot {
            current: vec![RemoteItem {
                id: "r-1".into(),
                content: "".into(),
                priority: None,
                due: None,
                completed_at: None,
            }],
            completed: vec![],
        };
        assert!(snapshot.into_task_set().is_err());
    }
}
