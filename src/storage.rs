//! Storage layer for tdsync state.
//!
//! All persistent state lives under `.tdsync/` at the sync root:
//!
//! ```text
//! .tdsync/
//!   correlations.jsonl   # append-only correlation event log
//!   resolutions.jsonl    # append-only audit log of policy decisions
//! ```
//!
//! The correlation log is event-sourced: the store is rebuilt by replaying
//! events in order. Replay is hardened against stray records; an event for
//! an unknown correlation is logged and skipped rather than aborting.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ulid::Ulid;

use crate::correlation::{Correlation, CorrelationStore, ResolutionRecord};
use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Name of the state directory at the sync root
pub const STATE_DIR: &str = ".tdsync";

const CORRELATIONS_LOG: &str = "correlations.jsonl";
const RESOLUTIONS_LOG: &str = "resolutions.jsonl";

/// Correlation log event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationEventType {
    Established,
    ContentsUpdated,
    Completed,
}

/// One record in the correlation event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationEvent {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: CorrelationEventType,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_content: Option<String>,
}

impl CorrelationEvent {
    fn new(event_type: CorrelationEventType, correlation_id: impl Into<String>) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            event_type,
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            remote_id: None,
            local_content: None,
            remote_content: None,
        }
    }

    pub fn established(correlation: &Correlation) -> Self {
        let mut event = Self::new(CorrelationEventType::Established, &correlation.id);
        event.remote_id = Some(correlation.remote_id.clone());
        event.local_content = Some(correlation.local_content.clone());
        event.remote_content = Some(correlation.remote_content.clone());
        event
    }

    pub fn contents_updated(correlation: &Correlation) -> Self {
        let mut event = Self::new(CorrelationEventType::ContentsUpdated, &correlation.id);
        event.local_content = Some(correlation.local_content.clone());
        event.remote_content = Some(correlation.remote_content.clone());
        event
    }

    pub fn completed(correlation_id: impl Into<String>) -> Self {
        Self::new(CorrelationEventType::Completed, correlation_id)
    }
}

/// Storage manager rooted at the sync directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn correlations_log(&self) -> PathBuf {
        self.state_dir().join(CORRELATIONS_LOG)
    }

    pub fn resolutions_log(&self) -> PathBuf {
        self.state_dir().join(RESOLUTIONS_LOG)
    }

    pub fn is_initialized(&self) -> bool {
        self.state_dir().is_dir()
    }

    /// Create the state directory; returns true if it was created.
    pub fn init(&self) -> Result<bool> {
        let dir = self.state_dir();
        if dir.exists() {
            if !dir.is_dir() {
                return Err(Error::OperationFailed(format!(
                    "Expected directory at {}",
                    dir.display()
                )));
            }
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        Ok(true)
    }

    /// Error unless `init` has been run for this root.
    pub fn require_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized(self.root.clone()))
        }
    }

    /// Rebuild the correlation store by replaying the event log.
    pub fn load_store(&self) -> Result<CorrelationStore> {
        let path = self.correlations_log();
        if !path.exists() {
            return Ok(CorrelationStore::new());
        }

        let text = fs::read_to_string(&path)?;
        let mut store = CorrelationStore::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: CorrelationEvent = serde_json::from_str(trimmed).map_err(|e| {
                Error::CorruptLog(format!(
                    "{} line {}: {}",
                    path.display(),
                    index + 1,
                    e
                ))
            })?;
            replay_event(&mut store, event);
        }

        Ok(store)
    }

    /// Append correlation events, one JSON record per line.
    pub fn append_events(&self, events: &[CorrelationEvent]) -> Result<()> {
        let path = self.correlations_log();
        for event in events {
            let line = serde_json::to_string(event)?;
            lock::append_line_locked(&path, &line, DEFAULT_LOCK_TIMEOUT_MS)?;
        }
        Ok(())
    }

    /// Append resolution audit records.
    pub fn append_resolutions(&self, records: &[ResolutionRecord]) -> Result<()> {
        let path = self.resolutions_log();
        for record in records {
            let line = serde_json::to_string(record)?;
            lock::append_line_locked(&path, &line, DEFAULT_LOCK_TIMEOUT_MS)?;
        }
        Ok(())
    }

    /// Read the resolution audit log, oldest first.
    pub fn read_resolutions(&self) -> Result<Vec<ResolutionRecord>> {
        let path = self.resolutions_log();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)?;
        let mut records = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            records.push(serde_json::from_str(trimmed)?);
        }
        Ok(records)
    }
}

fn replay_event(store: &mut CorrelationStore, event: CorrelationEvent) {
    match event.event_type {
        CorrelationEventType::Established => {
            let (Some(remote_id), Some(local_content), Some(remote_content)) = (
                event.remote_id,
                event.local_content,
                event.remote_content,
            ) else {
                warn!(
                    correlation_id = %event.correlation_id,
                    "skipping incomplete established event"
                );
                return;
            };
            let mut correlation = Correlation::new(
                &event.correlation_id,
                remote_id,
                local_content,
                remote_content,
            );
            correlation.created_at = event.timestamp;
            correlation.updated_at = event.timestamp;
            store.insert(correlation);
        }
        CorrelationEventType::ContentsUpdated => {
            let (Some(local_content), Some(remote_content)) =
                (event.local_content, event.remote_content)
            else {
                warn!(
                    correlation_id = %event.correlation_id,
                    "skipping incomplete contents_updated event"
                );
                return;
            };
            match store.get_mut(&event.correlation_id) {
                Some(correlation) => {
                    correlation.update_contents(local_content, remote_content);
                    correlation.updated_at = event.timestamp;
                }
                None => warn!(
                    correlation_id = %event.correlation_id,
                    "contents_updated for unknown correlation"
                ),
            }
        }
        CorrelationEventType::Completed => match store.get_mut(&event.correlation_id) {
            Some(correlation) => {
                correlation.mark_completed();
                correlation.updated_at = event.timestamp;
            }
            None => warn!(
                correlation_id = %event.correlation_id,
                "completed for unknown correlation"
            ),
        },
    }
}

/// Compute the events that take `before` to `after`.
///
/// Used after a sync run: the categorizer and the changeset absorption
/// mutate an in-memory copy, and the delta is appended to the log.
pub fn events_between(before: &CorrelationStore, after: &CorrelationStore) -> Vec<CorrelationEvent> {
    let mut events = Vec::new();

    for correlation in after.iter() {
        match before.get(&correlation.id) {
            None => events.push(CorrelationEvent::established(correlation)),
            Some(old) => {
                if old.local_checksum != correlation.local_checksum
                    || old.remote_checksum != correlation.remote_checksum
                {
                    events.push(CorrelationEvent::contents_updated(correlation));
                }
                if old.is_current() && !correlation.is_current() {
                    events.push(CorrelationEvent::completed(&correlation.id));
                }
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path());
        storage.init().expect("init");
        (dir, storage)
    }

    #[test]
    fn empty_log_loads_empty_store() {
        let (_dir, storage) = storage();
        let store = storage.load_store().expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn events_round_trip_through_the_log() {
        let (_dir, storage) = storage();

        let correlation = Correlation::new("1234", "r-1", "Buy milk", "Buy milk");
        storage
            .append_events(&[CorrelationEvent::established(&correlation)])
            .expect("append");

        let store = storage.load_store().expect("load");
        let loaded = store.get("1234").expect("correlation");
        assert_eq!(loaded.remote_id, "r-1");
        assert_eq!(loaded.local_content, "Buy milk");
        assert!(loaded.is_current());
    }

    #[test]
    fn replay_applies_updates_and_completion() {
        let (_dir, storage) = storage();

        let mut correlation = Correlation::new("1234", "r-1", "Buy milk", "Buy milk");
        let established = CorrelationEvent::established(&correlation);
        correlation.update_contents("Buy oat milk", "Buy oat milk");
        let updated = CorrelationEvent::contents_updated(&correlation);
        let completed = CorrelationEvent::completed("1234");

        storage
            .append_events(&[established, updated, completed])
            .expect("append");

        let store = storage.load_store().expect("load");
        let loaded = store.get("1234").expect("correlation");
        assert_eq!(loaded.local_content, "Buy oat milk");
        assert!(!loaded.is_current());
    }

    #[test]
    fn replay_skips_events_for_unknown_correlations() {
        let (_dir, storage) = storage();
        storage
            .append_events(&[CorrelationEvent::completed("9999")])
            .expect("append");

        let store = storage.load_store().expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_log_line_is_an_error() {
        let (_dir, storage) = storage();
        fs::write(storage.correlations_log(), "not json\n").expect("write");
        assert!(storage.load_store().is_err());
    }

    #[test]
    fn events_between_detects_all_transitions() {
        let before = CorrelationStore::from_correlations(vec![
            Correlation::new("1111", "r-1", "a", "a"),
            Correlation::new("2222", "r-2", "b", "b"),
        ]);

        let mut after = before.clone();
        after.insert(Correlation::new("3333", "r-3", "c", "c"));
        after.get_mut("1111").unwrap().update_contents("a2", "a2");
        after.get_mut("2222").unwrap().mark_completed();

        let events = events_between(&before, &after);
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert!(types.contains(&CorrelationEventType::Established));
        assert!(types.contains(&CorrelationEventType::ContentsUpdated));
        assert!(types.contains(&CorrelationEventType::Completed));
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn resolutions_append_and_read_back() {
        let (_dir, storage) = storage();
        let record = ResolutionRecord {
            timestamp: Utc::now(),
            content: "Call dentist".into(),
            old_priority: Some(3),
            new_priority: Some(1),
            decision: "local-wins".into(),
        };
        storage.append_resolutions(&[record.clone()]).expect("append");

        let records = storage.read_resolutions().expect("read");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "Call dentist");
    }
}
