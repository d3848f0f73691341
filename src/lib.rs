//! tdsync - Todo File Synchronization Library
//!
//! This library provides the core functionality for the tdsync CLI tool,
//! a bidirectional bridge between a plain-text todo file and a remote
//! task-manager project snapshot.
//!
//! # Core Concepts
//!
//! - **Markers**: correlation ids embedded in task text, `(NNNN)` style
//! - **Correlations**: persistent links between a local task and a remote task
//! - **Categorization**: six-pass diff producing a partitioned change-set
//! - **Conflict Policies**: pluggable priority resolution (local-wins default)
//! - **Correlation Log**: append-only event log the store is replayed from
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tdsync.toml`
//! - `error`: Error types and result aliases
//! - `marker`: Embedded correlation-id codec
//! - `checksum`: Content checksums and fuzzy similarity
//! - `task`: Task and task-set model shared by both sides
//! - `priority`: Priority scale mapping between the two systems
//! - `correlation`: Correlation records and the in-memory store
//! - `changeset`: The partitioned change-set produced by categorization
//! - `categorize`: The categorization passes and changeset absorption
//! - `resolve`: Conflict resolution policies
//! - `localfile`: Plain-text todo file parsing and rendering
//! - `snapshot`: Remote project snapshot loading
//! - `storage`: Event log persistence under `.tdsync/`
//! - `lock`: File locking and atomic operations for concurrency safety

pub mod categorize;
pub mod changeset;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod error;
pub mod localfile;
pub mod lock;
pub mod marker;
pub mod output;
pub mod priority;
pub mod resolve;
pub mod snapshot;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
