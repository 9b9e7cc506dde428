//! Mock aligner for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::sync::{
    AlignmentJob, AlignmentResult, CancelSignal, ProgressReporter, SubtitleAligner, SyncError,
};

/// Mock implementation of the SubtitleAligner trait.
///
/// Provides controllable behavior for testing:
/// - Track alignment jobs for assertions
/// - Simulate progress steps with a delay between them
/// - Simulate failure, or a run that only ends when cancelled
///
/// On success the unsynced subtitle is copied to the output path.
///
/// # Example
///
/// ```rust,ignore
/// use mediadash_core::testing::MockAligner;
///
/// let aligner = MockAligner::new();
/// aligner.set_steps(vec![10, 50, 100], Duration::from_millis(20)).await;
///
/// let sync = SubtitleSynchronizer::new(SyncConfig::default(), aligner);
/// sync.sync_auto(&output, &unsynced, &media).await?;
/// ```
#[derive(Debug, Clone)]
pub struct MockAligner {
    /// Recorded jobs.
    jobs: Arc<RwLock<Vec<AlignmentJob>>>,
    /// Percentages reported in order.
    steps: Arc<RwLock<Vec<u8>>>,
    /// Delay before each step.
    step_delay: Arc<RwLock<Duration>>,
    /// If set, runs wait for cancellation after the last step.
    hold_until_cancelled: Arc<RwLock<bool>>,
    /// If set, the next run fails with this error.
    next_error: Arc<RwLock<Option<SyncError>>>,
}

impl Default for MockAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAligner {
    /// Creates an aligner that reports 0, 50 and 100 percent.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            steps: Arc::new(RwLock::new(vec![0, 50, 100])),
            step_delay: Arc::new(RwLock::new(Duration::from_millis(1))),
            hold_until_cancelled: Arc::new(RwLock::new(false)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets the reported percentages and the delay before each one.
    pub async fn set_steps(&self, steps: Vec<u8>, delay: Duration) {
        *self.steps.write().await = steps;
        *self.step_delay.write().await = delay;
    }

    /// Keeps runs alive until cancelled.
    pub async fn set_hold_until_cancelled(&self, hold: bool) {
        *self.hold_until_cancelled.write().await = hold;
    }

    /// Makes the next run fail.
    pub async fn set_next_error(&self, error: SyncError) {
        *self.next_error.write().await = Some(error);
    }

    /// Returns all jobs received so far.
    pub async fn recorded_jobs(&self) -> Vec<AlignmentJob> {
        self.jobs.read().await.clone()
    }

    /// Clears recorded jobs.
    pub async fn clear(&self) {
        self.jobs.write().await.clear();
    }
}

#[async_trait]
impl SubtitleAligner for MockAligner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn align(
        &self,
        job: &AlignmentJob,
        progress: ProgressReporter,
        mut cancel: CancelSignal,
    ) -> Result<AlignmentResult, SyncError> {
        self.jobs.write().await.push(job.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let steps = self.steps.read().await.clone();
        let delay = *self.step_delay.read().await;
        for step in steps {
            tokio::select! {
                _ = tokio::time::sleep(delay) => progress.report(step),
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            }
        }

        if *self.hold_until_cancelled.read().await {
            cancel.cancelled().await;
            return Err(SyncError::Cancelled);
        }

        tokio::fs::copy(&job.unsynced_path, &job.output_path).await?;

        Ok(AlignmentResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            duration_ms: 0,
        })
    }

    async fn validate(&self) -> Result<(), SyncError> {
        Ok(())
    }
}
