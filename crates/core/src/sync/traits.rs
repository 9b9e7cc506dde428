//! Trait definitions for the sync module.

use async_trait::async_trait;

use super::error::SyncError;
use super::progress::ProgressReporter;
use super::slot::CancelSignal;
use super::types::{AlignmentJob, AlignmentResult};

/// A tool that aligns a subtitle file against a reference.
#[async_trait]
pub trait SubtitleAligner: Send + Sync {
    /// Returns the name of this aligner implementation.
    fn name(&self) -> &str;

    /// Runs one alignment.
    ///
    /// Progress goes to `progress` as it is observed. Must return
    /// `SyncError::Cancelled` promptly once `cancel` fires, leaving no
    /// process behind.
    async fn align(
        &self,
        job: &AlignmentJob,
        progress: ProgressReporter,
        cancel: CancelSignal,
    ) -> Result<AlignmentResult, SyncError>;

    /// Validates that the aligner is installed and can start.
    async fn validate(&self) -> Result<(), SyncError>;
}
