//! Configuration loading and management
//!
//! Handles parsing of `.tdsync.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resolve::PolicyKind;

/// Name of the config file at the sync root.
pub const CONFIG_FILE: &str = ".tdsync.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the plain-text todo file, relative to the sync root
    #[serde(default = "default_todo_file")]
    pub todo_file: PathBuf,

    /// Path to the pre-fetched remote snapshot, relative to the sync root
    #[serde(default = "default_remote_snapshot")]
    pub remote_snapshot: PathBuf,

    /// Matching configuration
    #[serde(default, rename = "match")]
    pub matching: MatchConfig,

    /// Conflict resolution configuration
    #[serde(default)]
    pub resolve: ResolveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            todo_file: default_todo_file(),
            remote_snapshot: default_remote_snapshot(),
            matching: MatchConfig::default(),
            resolve: ResolveConfig::default(),
        }
    }
}

fn default_todo_file() -> PathBuf {
    PathBuf::from("todo.txt")
}

fn default_remote_snapshot() -> PathBuf {
    PathBuf::from("remote.json")
}

/// Fuzzy-matching and sync-window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Acceptance threshold for fuzzy content similarity
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Remote completions older than this many days are ignored
    #[serde(default = "default_completed_window_days")]
    pub completed_window_days: i64,
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_completed_window_days() -> i64 {
    30
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            completed_window_days: default_completed_window_days(),
        }
    }
}

/// Conflict resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Policy name: "local-wins" or "remote-wins"
    #[serde(default = "default_policy")]
    pub policy: String,
}

fn default_policy() -> String {
    "local-wins".to_string()
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
        }
    }
}

impl Config {
    /// Load config from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a sync root directory, using defaults if missing
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The parsed conflict-resolution policy
    pub fn policy_kind(&self) -> Result<PolicyKind> {
        self.resolve.policy.parse()
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidConfig(format!(
                "similarity_threshold must be in [0, 1], got {threshold}"
            )));
        }
        if self.matching.completed_window_days <= 0 {
            return Err(Error::InvalidConfig(format!(
                "completed_window_days must be positive, got {}",
                self.matching.completed_window_days
            )));
        }
        self.policy_kind()?;
        Ok(())
    }
}
