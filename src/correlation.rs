//! Correlation records and the in-memory correlation store.
//!
//! A correlation is the durable link between one local task and one remote
//! task, carrying the last-seen content and checksums of both sides. The
//! store is explicit state passed into the categorizer, never ambient: it is
//! loaded from the correlation log, queried and updated during a run, and
//! persisted by the caller afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::checksum;

/// Lifecycle status of a correlation.
///
/// Flips to `Completed` when either side reports completion. Correlations are
/// never deleted while either side still references them, so a task missing
/// from the current lists can be recognized as completed rather than new.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStatus {
    Current,
    Completed,
}

/// A durable link between exactly one local task and one remote task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Correlation {
    /// Stable id for the link's lifetime; also embedded in local task text.
    pub id: String,
    pub remote_id: String,
    pub local_content: String,
    pub remote_content: String,
    pub local_checksum: String,
    pub remote_checksum: String,
    pub status: CorrelationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Correlation {
    /// Create a fresh correlation from both sides' marker-stripped content.
    pub fn new(
        id: impl Into<String>,
        remote_id: impl Into<String>,
        local_content: impl Into<String>,
        remote_content: impl Into<String>,
    ) -> Self {
        let local_content = local_content.into();
        let remote_content = remote_content.into();
        let now = Utc::now();
        Self {
            id: id.into(),
            remote_id: remote_id.into(),
            local_checksum: checksum::checksum(&local_content),
            remote_checksum: checksum::checksum(&remote_content),
            local_content,
            remote_content,
            status: CorrelationStatus::Current,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the latest observed content of both sides.
    pub fn update_contents(
        &mut self,
        local_content: impl Into<String>,
        remote_content: impl Into<String>,
    ) {
        self.local_content = local_content.into();
        self.remote_content = remote_content.into();
        self.local_checksum = checksum::checksum(&self.local_content);
        self.remote_checksum = checksum::checksum(&self.remote_content);
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = CorrelationStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn is_current(&self) -> bool {
        self.status == CorrelationStatus::Current
    }
}

/// A fuzzy-match hit against the store.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub correlation: Correlation,
    pub similarity: f64,
}

/// Audit record for an automatic conflict-policy decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionRecord {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_priority: Option<u8>,
    pub decision: String,
}

/// The set of known local<->remote links, keyed by correlation id.
///
/// Backed by a `BTreeMap` so iteration order is stable; fuzzy-match
/// tie-breaks depend on it.
#[derive(Debug, Clone, Default)]
pub struct CorrelationStore {
    correlations: BTreeMap<String, Correlation>,
    resolutions: Vec<ResolutionRecord>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_correlations(records: impl IntoIterator<Item = Correlation>) -> Self {
        let correlations = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            correlations,
            resolutions: Vec::new(),
        }
    }

    pub fn insert(&mut self, correlation: Correlation) {
        self.correlations
            .insert(correlation.id.clone(), correlation);
    }

    pub fn get(&self, id: &str) -> Option<&Correlation> {
        self.correlations.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Correlation> {
        self.correlations.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.correlations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correlations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Correlation> {
        self.correlations.values()
    }

    /// All correlations whose status is `current`.
    pub fn current(&self) -> impl Iterator<Item = &Correlation> {
        self.correlations.values().filter(|c| c.is_current())
    }

    /// Find the correlation that links to a given remote task id.
    pub fn find_by_remote_id(&self, remote_id: &str) -> Option<&Correlation> {
        self.correlations
            .values()
            .find(|c| c.remote_id == remote_id)
    }

    /// Best fuzzy match of `content` against stored content, at or above
    /// `threshold`.
    ///
    /// Both sides' stored content are candidates. Ties keep the first hit in
    /// store order, so repeated runs pick the same candidate.
    pub fn find_by_content_similarity(
        &self,
        content: &str,
        threshold: f64,
    ) -> Option<SimilarityHit> {
        let mut best: Option<SimilarityHit> = None;

        for correlation in self.correlations.values() {
            let score = checksum::similarity(content, &correlation.local_content)
                .max(checksum::similarity(content, &correlation.remote_content));
            if score < threshold {
                continue;
            }
            let better = best
                .as_ref()
                .map(|hit| score > hit.similarity)
                .unwrap_or(true);
            if better {
                best = Some(SimilarityHit {
                    correlation: correlation.clone(),
                    similarity: score,
                });
            }
        }

        best
    }

    /// Record an automatic conflict-policy decision.
    ///
    /// Buffered in memory; the caller persists the buffer to the audit log
    /// after a non-preview run.
    pub fn log_resolution(
        &mut self,
        content: impl Into<String>,
        old_priority: Option<u8>,
        new_priority: Option<u8>,
        decision: impl Into<String>,
    ) {
        self.resolutions.push(ResolutionRecord {
            timestamp: Utc::now(),
            content: content.into(),
            old_priority,
            new_priority,
            decision: decision.into(),
        });
    }

    /// Drain buffered resolution records for persistence.
    pub fn take_resolutions(&mut self) -> Vec<ResolutionRecord> {
        std::mem::take(&mut self.resolutions)
    }

    pub fn pending_resolutions(&self) -> &[ResolutionRecord] {
        &self.resolutions
    }
}

/// Generate a new correlation id: random, salted with the task content.
///
/// Ids are numeric so they fit the `(NNNN)` marker form. Collision
/// probability is negligible for personal-scale task counts; the store
/// rejects nothing, last write wins.
pub fn generate_correlation_id(seed_content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed_content.as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    let digest = hasher.finalize();

    let mut value = 0u64;
    for byte in digest.iter().take(8) {
        value = (value << 8) | u64::from(*byte);
    }
    // Eight digits, never leading-zero.
    format!("{}", 10_000_000 + value % 90_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(records: Vec<Correlation>) -> CorrelationStore {
        CorrelationStore::from_correlations(records)
    }

    #[test]
    fn new_correlation_checksums_match_content() {
        let corr = Correlation::new("1234", "r-1", "Buy milk", "Buy milk");
        assert_eq!(corr.local_checksum, checksum::checksum("Buy milk"));
        assert_eq!(corr.remote_checksum, corr.local_checksum);
        assert!(corr.is_current());
    }

    #[test]
    fn update_contents_refreshes_checksums() {
        let mut corr = Correlation::new("1234", "r-1", "Buy milk", "Buy milk");
        let old = corr.local_checksum.clone();
        corr.update_contents("Buy oat milk", "Buy milk");
        assert_ne!(corr.local_checksum, old);
        assert_eq!(corr.remote_checksum, old);
    }

    #[test]
    fn find_by_remote_id_hits_and_misses() {
        let store = store_with(vec![
            Correlation::new("1111", "r-1", "a", "a"),
            Correlation::new("2222", "r-2", "b", "b"),
        ]);
        assert_eq!(store.find_by_remote_id("r-2").unwrap().id, "2222");
        assert!(store.find_by_remote_id("r-9").is_none());
    }

    #[test]
    fn similarity_query_respects_threshold() {
        let store = store_with(vec![Correlation::new(
            "1111",
            "r-1",
            "call the dentist",
            "call the dentist",
        )]);

        let hit = store
            .find_by_content_similarity("call the dentist asap", 0.5)
            .expect("hit");
        assert_eq!(hit.correlation.id, "1111");
        assert!(hit.similarity >= 0.5);

        assert!(store
            .find_by_content_similarity("walk the dog", 0.8)
            .is_none());
    }

    #[test]
    fn similarity_query_prefers_best_score_then_first() {
        let store = store_with(vec![
            Correlation::new("1111", "r-1", "call the dentist", "call the dentist"),
            Correlation::new("2222", "r-2", "call the dentist asap", "call the dentist asap"),
        ]);

        let hit = store
            .find_by_content_similarity("call the dentist asap", 0.5)
            .expect("hit");
        assert_eq!(hit.correlation.id, "2222");
        assert_eq!(hit.similarity, 1.0);
    }

    #[test]
    fn resolutions_are_buffered_and_drained() {
        let mut store = CorrelationStore::new();
        store.log_resolution("Call dentist", Some(3), Some(1), "local-wins");
        assert_eq!(store.pending_resolutions().len(), 1);

        let drained = store.take_resolutions();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].new_priority, Some(1));
        assert!(store.pending_resolutions().is_empty());
    }

    #[test]
    fn generated_ids_are_numeric_and_distinct() {
        let a = generate_correlation_id("Buy milk");
        let b = generate_correlation_id("Buy milk");
        assert!(a.bytes().all(|c| c.is_ascii_digit()));
        assert_eq!(a.len(), 8);
        // Random salt makes equal seeds diverge.
        assert_ne!(a, b);
    }
}
