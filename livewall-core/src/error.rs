// ============================================================================
// livewall-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core error type and helpers
//
// Every fallible operation in the library returns `CoreResult<T>`. Per-file
// pipeline errors are converted into a `FailureKind` by the batch
// orchestrator; process-level errors (missing binaries, bad configuration)
// propagate out of `run_batch` directly.

use serde::Serialize;
use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the conversion pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Probe failed for {path}: {reason}")]
    Probe { path: String, reason: String },

    #[error("Invalid source geometry: {0}")]
    Geometry(String),

    #[error("Cannot build encode specification: {0}")]
    EncodeSpec(String),

    #[error("Encoder exited with {}: {stderr}", describe_exit_code(.exit_code))]
    Execution {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {}s", .after.as_secs_f64())]
    Timeout { tool: String, after: Duration },

    #[error("Cancelled")]
    Cancelled,

    #[error("Output validation failed: {0}")]
    Validation(String),

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("{tool} failed with {}: {stderr}", describe_exit_code(.exit_code))]
    CommandFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("No processable video files found")]
    NoFilesFound,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory traversal error: {0}")]
    Walkdir(#[from] walkdir::Error),
}

/// Result type used throughout livewall-core.
pub type CoreResult<T> = Result<T, CoreError>;

fn describe_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Creates a `CommandStart` error for a process that could not be spawned.
pub fn command_start_error(tool: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(tool.into(), err)
}

/// Creates a `CommandFailed` error from an exit status and captured stderr.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        tool: tool.into(),
        exit_code: status.code(),
        stderr: stderr.into(),
    }
}

/// Creates a `Probe` error for the given input.
pub fn probe_error(path: &std::path::Path, reason: impl Into<String>) -> CoreError {
    CoreError::Probe {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

// ============================================================================
// FAILURE CLASSIFICATION
// ============================================================================

/// Classification of a per-file failure, recorded in `ConversionResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Probe,
    Geometry,
    EncodeSpec,
    Execution,
    TimedOut,
    Cancelled,
    Validation,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Probe => "probe failed",
            FailureKind::Geometry => "invalid geometry",
            FailureKind::EncodeSpec => "encoder unavailable",
            FailureKind::Execution => "encode failed",
            FailureKind::TimedOut => "timed out",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Validation => "validation failed",
            FailureKind::Io => "io error",
        };
        f.write_str(label)
    }
}

impl CoreError {
    /// Maps an error raised while converting one file to its failure kind.
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            CoreError::Probe { .. } | CoreError::JsonParse(_) => FailureKind::Probe,
            CoreError::Geometry(_) => FailureKind::Geometry,
            CoreError::EncodeSpec(_) => FailureKind::EncodeSpec,
            CoreError::Execution { .. }
            | CoreError::CommandStart(..)
            | CoreError::CommandFailed { .. } => FailureKind::Execution,
            CoreError::Timeout { .. } => FailureKind::TimedOut,
            CoreError::Cancelled => FailureKind::Cancelled,
            CoreError::Validation(_) => FailureKind::Validation,
            CoreError::DependencyNotFound(_)
            | CoreError::Config(_)
            | CoreError::PathError(_)
            | CoreError::NoFilesFound
            | CoreError::Io(_)
            | CoreError::Walkdir(_) => FailureKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinct_from_execution_failure() {
        let timeout = CoreError::Timeout {
            tool: "ffmpeg".to_string(),
            after: Duration::from_secs(5),
        };
        let exit = CoreError::Execution {
            exit_code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(timeout.failure_kind(), FailureKind::TimedOut);
        assert_eq!(exit.failure_kind(), FailureKind::Execution);
        assert_ne!(timeout.failure_kind(), exit.failure_kind());
    }

    #[test]
    fn test_execution_error_message_includes_exit_code() {
        let err = CoreError::Execution {
            exit_code: Some(187),
            stderr: "Unknown encoder".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 187"));
        assert!(message.contains("Unknown encoder"));

        let killed = CoreError::Execution {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("terminated by signal"));
    }
}
