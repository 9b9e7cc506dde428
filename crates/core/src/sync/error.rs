//! Error types for the sync module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during subtitle synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// External tool missing or could not be started.
    #[error("{tool} unavailable at {path}: {reason}")]
    ToolUnavailable {
        tool: String,
        path: PathBuf,
        reason: String,
    },

    /// Alignment tool ran and exited non-zero.
    #[error("Alignment failed with exit code {exit_code:?}")]
    AlignmentFailed {
        exit_code: Option<i32>,
        output: Option<String>,
    },

    /// Embedded subtitle extraction failed.
    #[error("Demux failed: {reason}")]
    DemuxFailed { reason: String },

    /// Another sync job holds the slot.
    #[error("Sync job {job_id} is already running")]
    Busy { job_id: String },

    /// Cancel requested with no job running.
    #[error("No sync job is running")]
    NoActiveJob,

    /// Job was cancelled.
    #[error("Sync cancelled")]
    Cancelled,

    /// Alignment timed out.
    #[error("Alignment timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// No media file matched the title.
    #[error("No matching media file found for {title}")]
    MediaNotFound { title: String },

    /// Background job ended abnormally.
    #[error("Sync job failed: {reason}")]
    Internal { reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Creates a tool unavailable error.
    pub fn tool_unavailable(
        tool: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        Self::ToolUnavailable {
            tool: tool.into(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an alignment failed error.
    pub fn alignment_failed(exit_code: Option<i32>, output: Option<String>) -> Self {
        Self::AlignmentFailed { exit_code, output }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::Timeout { .. } | Self::Io(_))
    }

    /// Metric label for this outcome.
    pub(crate) fn result_label(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::ToolUnavailable { .. } => "unavailable",
            Self::Timeout { .. } => "timeout",
            _ => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_and_failed_are_distinct() {
        let unavailable = SyncError::tool_unavailable("aligner", "/usr/bin/ffs", "not found");
        let failed = SyncError::alignment_failed(Some(1), None);
        assert!(matches!(unavailable, SyncError::ToolUnavailable { .. }));
        assert!(matches!(failed, SyncError::AlignmentFailed { .. }));
        assert_eq!(unavailable.result_label(), "unavailable");
        assert_eq!(failed.result_label(), "failed");
        assert!(unavailable.to_string().contains("/usr/bin/ffs"));
    }

    #[test]
    fn test_retryable() {
        assert!(SyncError::Busy {
            job_id: "a".into()
        }
        .is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
    }
}
