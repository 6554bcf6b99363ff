//! Error types for narrow-filter.
//!
//! Filter operations themselves are infallible: malformed input degrades to
//! well-formed but conservative terms. Errors exist at the edges.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level CLI error wrapping every edge failure
//!   - [`ConfigError`](crate::config::ConfigError) - config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - tracing subscriber setup
//!   - [`SnapshotError`] - workspace snapshot read/parse failures
//!   - `std::io::Error` - writing the report
//! - [`InvalidOperand`] - user-facing report for a term whose operand is not
//!   meaningful for its operator. Never fatal; callers display it.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    /// Config file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber setup failed.
    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// Workspace snapshot could not be loaded.
    #[error("Failed to load workspace snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Report serialization failed.
    #[error("Failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    /// Writing to stdout failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading a workspace snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("Failed to read snapshot at {path}: {source}")]
    Read {
        /// Snapshot file location.
        path: PathBuf,
        /// Underlying read failure.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON for the expected schema.
    #[error("Invalid snapshot JSON in {path}: {message}")]
    Parse {
        /// Snapshot file location.
        path: PathBuf,
        /// serde_json error text.
        message: String,
    },
}

/// A term whose operand is not valid for its operator.
///
/// # Examples
///
/// ```
/// use narrow_filter::model::error::InvalidOperand;
///
/// let err = InvalidOperand { operator: "has".into(), operand: "gif".into() };
/// assert_eq!(err.to_string(), "invalid gif operand for has operator");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {operand} operand for {operator} operator")]
pub struct InvalidOperand {
    /// Canonical operator name.
    pub operator: String,
    /// The rejected operand, as given.
    pub operand: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn snapshot_read_error_mentions_path() {
        let err = SnapshotError::Read {
            path: PathBuf::from("/tmp/missing.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn snapshot_error_converts_to_app_error() {
        let err: AppError = SnapshotError::Parse {
            path: PathBuf::from("w.json"),
            message: "expected value at line 1 column 1".into(),
        }
        .into();
        assert!(matches!(err, AppError::Snapshot(_)));
        assert!(err.to_string().contains("line 1 column 1"));
    }

    #[test]
    fn io_error_converts_to_app_error() {
        let err: AppError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn invalid_operand_display() {
        let err = InvalidOperand {
            operator: "is".into(),
            operand: "bogus".into(),
        };
        assert_eq!(err.to_string(), "invalid bogus operand for is operator");
    }
}
