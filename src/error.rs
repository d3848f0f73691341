//! Error types for tdsync
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, malformed todo file or snapshot, invalid config)
//! - 3: Blocked (unresolved conflicts present on a non-preview sync)
//! - 4: Operation failed (IO, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tdsync CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for tdsync operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Not a tdsync directory (run `tdsync init`): {0}")]
    NotInitialized(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed todo file at line {line}: {reason}")]
    MalformedTodoLine { line: usize, reason: String },

    #[error("Malformed task record: {0}")]
    MalformedTask(String),

    #[error("Malformed remote snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // Blocked (exit code 3)
    #[error("{0} unresolved conflict(s); resolve before applying")]
    UnresolvedConflicts(usize),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Correlation log corrupt: {0}")]
    CorruptLog(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::NotInitialized(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::MalformedTodoLine { .. }
            | Error::MalformedTask(_)
            | Error::MalformedSnapshot(_)
            | Error::FileNotFound(_) => exit_codes::USER_ERROR,

            // Blocked
            Error::UnresolvedConflicts(_) => exit_codes::BLOCKED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::CorruptLog(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Extra structured detail for JSON error envelopes
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::MalformedTodoLine { line, reason } => Some(serde_json::json!({
                "line": line,
                "reason": reason,
            })),
            Error::UnresolvedConflicts(count) => {
                Some(serde_json::json!({ "conflicts": count }))
            }
            _ => None,
        }
    }
}

/// Result type alias for tdsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(
            Error::MalformedTask("empty content".into()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::UnresolvedConflicts(2).exit_code(),
            exit_codes::BLOCKED
        );
        assert_eq!(
            Error::LockFailed(PathBuf::from("/tmp/x.lock")).exit_code(),
            exit_codes::OPERATION_FAILED
        );
    }

    #[test]
    fn malformed_line_carries_details() {
        let err = Error::MalformedTodoLine {
            line: 7,
            reason: "missing checkbox".into(),
        };
        let details = err.details().expect("details");
        assert_eq!(details["line"], 7);
    }
}
