//! Content checksums and word-overlap similarity.
//!
//! Checksums detect any character-level change to a task's text between sync
//! cycles. Similarity is a Jaccard index over whitespace-tokenized word sets,
//! used only for fuzzy rename/duplicate detection.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Default acceptance threshold for fuzzy content matching.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// SHA-256 digest of `text`, as a lowercase hex string.
pub fn checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Jaccard similarity of two strings over their lowercased word sets.
///
/// Order-insensitive; returns a value in `[0, 1]`. Two empty strings are
/// considered identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let words_a = word_set(a);
    let words_b = word_set(b);

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}
