//! Types for the sync module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// State of the process-wide sync slot as seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// No job has run yet.
    Idle,
    /// Alignment in progress; `percent` never decreases within a job.
    Running { job_id: String, percent: u8 },
    /// Tool exited; `success` iff exit code zero.
    Completed { job_id: String, success: bool },
    /// Cancelled on request.
    Cancelled { job_id: String },
}

impl SyncState {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Running { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Cancelled { job_id } => Some(job_id),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled { .. })
    }
}

/// What the unsynchronized subtitle was aligned against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum AlignmentReference {
    /// Subtitle track extracted from the media container.
    EmbeddedTrack(PathBuf),
    /// The media file itself (audio-based alignment).
    Media(PathBuf),
}

impl AlignmentReference {
    pub fn path(&self) -> &Path {
        match self {
            Self::EmbeddedTrack(p) | Self::Media(p) => p,
        }
    }
}

/// One invocation of the alignment tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentJob {
    pub job_id: String,
    pub reference: AlignmentReference,
    /// Subtitle to be aligned.
    pub unsynced_path: PathBuf,
    /// Where the aligned subtitle is written.
    pub output_path: PathBuf,
}

/// Result of a successful alignment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub duration_ms: u64,
}

/// Report returned by an automatic sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub job_id: String,
    pub output_path: PathBuf,
    pub reference: AlignmentReference,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Report returned by a fixed-offset sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetReport {
    pub output_path: PathBuf,
    pub offset_ms: i64,
    /// Timing lines rewritten.
    pub cues_shifted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_helpers() {
        assert_eq!(SyncState::Idle.job_id(), None);
        let running = SyncState::Running {
            job_id: "j1".into(),
            percent: 40,
        };
        assert!(running.is_running());
        assert_eq!(running.job_id(), Some("j1"));
        assert!(SyncState::Cancelled {
            job_id: "j1".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let state = SyncState::Running {
            job_id: "j1".into(),
            percent: 40,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["percent"], 40);
    }
}
