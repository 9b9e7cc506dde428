//! Subtitle synchronizer owning the single sync slot.

use chrono::Utc;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::SyncConfig;
use super::demux::{embedded_sidecar_path, MkvDemuxer};
use super::error::SyncError;
use super::progress::ProgressChannel;
use super::slot::{CancelSignal, JobSlot, SlotGuard};
use super::traits::SubtitleAligner;
use super::types::{AlignmentJob, AlignmentReference, SyncReport, SyncState};
use crate::metrics::{SYNC_BUSY_REJECTIONS, SYNC_DURATION, SYNC_JOBS_TOTAL};

/// Inputs of an automatic sync.
#[derive(Debug, Clone)]
pub struct AutoSyncRequest {
    pub output_path: PathBuf,
    pub unsynced_path: PathBuf,
    pub media_path: PathBuf,
}

impl AutoSyncRequest {
    pub fn new(
        output_path: impl Into<PathBuf>,
        unsynced_path: impl Into<PathBuf>,
        media_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            unsynced_path: unsynced_path.into(),
            media_path: media_path.into(),
        }
    }
}

/// Handle to a sync job running in the background.
#[derive(Debug)]
pub struct SyncHandle {
    job_id: String,
    join: JoinHandle<Result<SyncReport, SyncError>>,
}

impl SyncHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stops the job without asking the aligner, killing any child process.
    ///
    /// The slot is released and the job is published as cancelled.
    pub fn abort(&self) {
        self.join.abort();
    }

    /// Waits for the job to finish.
    pub async fn wait(self) -> Result<SyncReport, SyncError> {
        self.join.await.map_err(|e| {
            if e.is_cancelled() {
                SyncError::Cancelled
            } else {
                SyncError::Internal {
                    reason: e.to_string(),
                }
            }
        })?
    }
}

/// Aligns subtitles to media, one job at a time.
///
/// All jobs share one progress channel; `state()` and `report()` always refer
/// to the most recent job.
pub struct SubtitleSynchronizer<A: SubtitleAligner> {
    config: SyncConfig,
    aligner: Arc<A>,
    demuxer: MkvDemuxer,
    slot: Arc<JobSlot>,
    progress: ProgressChannel,
}

impl<A: SubtitleAligner + 'static> SubtitleSynchronizer<A> {
    pub fn new(config: SyncConfig, aligner: A) -> Self {
        let demuxer = MkvDemuxer::new(&config);
        Self {
            config,
            aligner: Arc::new(aligner),
            demuxer,
            slot: Arc::new(JobSlot::new()),
            progress: ProgressChannel::new(),
        }
    }

    pub fn aligner(&self) -> &A {
        &self.aligner
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Shared progress channel.
    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    /// State of the current or most recent job.
    pub fn state(&self) -> SyncState {
        self.progress.state()
    }

    /// Percent stream for the current or next job.
    pub fn report(&self) -> impl Stream<Item = u8> + Send + 'static {
        self.progress.report()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Requests cancellation of the running job, returning its id.
    pub fn cancel(&self) -> Result<String, SyncError> {
        let job_id = self.slot.cancel()?;
        info!("Cancellation requested for sync job {}", job_id);
        Ok(job_id)
    }

    /// Runs an automatic sync to completion.
    ///
    /// Fails with `Busy` immediately if another job is running.
    pub async fn sync_auto(
        &self,
        output_path: &Path,
        unsynced_path: &Path,
        media_path: &Path,
    ) -> Result<SyncReport, SyncError> {
        let job_id = Uuid::new_v4().to_string();
        let (guard, cancel) = self.acquire(&job_id)?;
        let request = AutoSyncRequest::new(output_path, unsynced_path, media_path);
        self.run_auto(guard, cancel, job_id, request).await
    }

    /// Starts an automatic sync on the runtime and returns its handle.
    ///
    /// The slot is claimed before this returns, so `Busy` is reported here
    /// rather than from the handle.
    pub fn spawn_auto(self: &Arc<Self>, request: AutoSyncRequest) -> Result<SyncHandle, SyncError> {
        let job_id = Uuid::new_v4().to_string();
        let (guard, cancel) = self.acquire(&job_id)?;

        let this = Arc::clone(self);
        let id = job_id.clone();
        let join = tokio::spawn(async move { this.run_auto(guard, cancel, id, request).await });

        Ok(SyncHandle { job_id, join })
    }

    fn acquire(&self, job_id: &str) -> Result<(SlotGuard, CancelSignal), SyncError> {
        self.slot.try_acquire(job_id, &self.progress).map_err(|e| {
            if let SyncError::Busy { job_id: ref running } = e {
                warn!("Rejected sync request, job {} is still running", running);
                SYNC_BUSY_REJECTIONS.inc();
            }
            e
        })
    }

    async fn run_auto(
        &self,
        guard: SlotGuard,
        mut cancel: CancelSignal,
        job_id: String,
        request: AutoSyncRequest,
    ) -> Result<SyncReport, SyncError> {
        for path in [&request.unsynced_path, &request.media_path] {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                SYNC_JOBS_TOTAL.with_label_values(&["auto", "failed"]).inc();
                return Err(SyncError::InputNotFound { path: path.clone() });
            }
        }

        self.progress.start(&job_id);
        info!(
            "Starting sync job {} for {:?} against {:?}",
            job_id, request.unsynced_path, request.media_path
        );

        let started_at = Utc::now();
        let start = Instant::now();

        let reference = self.prepare_reference(&request.media_path).await;
        let job = AlignmentJob {
            job_id: job_id.clone(),
            reference: reference.clone(),
            unsynced_path: request.unsynced_path.clone(),
            output_path: request.output_path.clone(),
        };

        let result = if cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            self.aligner
                .align(&job, self.progress.reporter(&job_id), cancel)
                .await
        };

        let elapsed = start.elapsed();
        let (final_state, label) = match &result {
            Ok(_) => (
                SyncState::Completed {
                    job_id: job_id.clone(),
                    success: true,
                },
                "success",
            ),
            Err(SyncError::Cancelled) => (
                SyncState::Cancelled {
                    job_id: job_id.clone(),
                },
                "cancelled",
            ),
            Err(e) => (
                SyncState::Completed {
                    job_id: job_id.clone(),
                    success: false,
                },
                e.result_label(),
            ),
        };

        // Publish before releasing the slot so a new job cannot be overwritten.
        self.progress.finish(final_state);
        drop(guard);

        SYNC_JOBS_TOTAL.with_label_values(&["auto", label]).inc();
        SYNC_DURATION
            .with_label_values(&[label])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(_) => {
                info!(
                    "Sync job {} finished in {:.1}s, output {:?}",
                    job_id,
                    elapsed.as_secs_f64(),
                    request.output_path
                );
                Ok(SyncReport {
                    job_id,
                    output_path: request.output_path,
                    reference,
                    started_at,
                    finished_at: Utc::now(),
                    duration_ms: elapsed.as_millis() as u64,
                })
            }
            Err(SyncError::Cancelled) => {
                info!("Sync job {} cancelled", job_id);
                Err(SyncError::Cancelled)
            }
            Err(e) => {
                error!("Sync job {} failed: {}", job_id, e);
                Err(e)
            }
        }
    }

    /// Picks the alignment reference for `media`.
    ///
    /// An existing embedded-track sidecar is reused. Otherwise the first SubRip
    /// track is extracted; if that fails the media file itself is used.
    async fn prepare_reference(&self, media: &Path) -> AlignmentReference {
        if !self.config.extract_embedded {
            return AlignmentReference::Media(media.to_path_buf());
        }

        let sidecar = embedded_sidecar_path(media);
        if tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
            debug!("Reusing extracted subtitle track {:?}", sidecar);
            return AlignmentReference::EmbeddedTrack(sidecar);
        }

        match self.demuxer.extract_first_srt(media, &sidecar).await {
            Ok(path) => AlignmentReference::EmbeddedTrack(path),
            Err(e) => {
                warn!("Aligning against {:?} directly: {}", media, e);
                AlignmentReference::Media(media.to_path_buf())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAligner;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        media: PathBuf,
        unsynced: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("Inception.mkv");
        let unsynced = dir.path().join("Inception.heb.srt");
        std::fs::write(&media, b"not really matroska").unwrap();
        std::fs::write(&unsynced, "1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();
        let output = dir.path().join("Inception.heb.synced.srt");
        Fixture {
            dir,
            media,
            unsynced,
            output,
        }
    }

    fn offline_config() -> SyncConfig {
        SyncConfig::default().with_mkvtoolnix("/nonexistent/mkvmerge", "/nonexistent/mkvextract")
    }

    #[tokio::test]
    async fn test_sync_auto_success_falls_back_to_media() {
        let f = fixture();
        let sync = SubtitleSynchronizer::new(offline_config(), MockAligner::new());

        let report = sync.sync_auto(&f.output, &f.unsynced, &f.media).await.unwrap();

        assert_eq!(report.reference, AlignmentReference::Media(f.media.clone()));
        assert!(f.output.exists());
        assert_eq!(
            sync.state(),
            SyncState::Completed {
                job_id: report.job_id.clone(),
                success: true
            }
        );
        assert!(!sync.is_busy());
    }

    #[tokio::test]
    async fn test_existing_sidecar_is_reused() {
        let f = fixture();
        let sidecar = f.dir.path().join("Inception.embedded.srt");
        std::fs::write(&sidecar, "1\n00:00:01,000 --> 00:00:02,000\nRef\n").unwrap();
        let sync = SubtitleSynchronizer::new(offline_config(), MockAligner::new());

        let report = sync.sync_auto(&f.output, &f.unsynced, &f.media).await.unwrap();

        assert_eq!(report.reference, AlignmentReference::EmbeddedTrack(sidecar));
    }

    #[tokio::test]
    async fn test_extraction_disabled_uses_media() {
        let f = fixture();
        std::fs::write(f.dir.path().join("Inception.embedded.srt"), "").unwrap();
        let sync = SubtitleSynchronizer::new(
            offline_config().with_extract_embedded(false),
            MockAligner::new(),
        );

        let report = sync.sync_auto(&f.output, &f.unsynced, &f.media).await.unwrap();
        assert_eq!(report.reference, AlignmentReference::Media(f.media.clone()));
    }

    #[tokio::test]
    async fn test_failure_marks_completed_unsuccessful() {
        let f = fixture();
        let aligner = MockAligner::new();
        aligner
            .set_next_error(SyncError::alignment_failed(Some(1), None))
            .await;
        let sync = SubtitleSynchronizer::new(offline_config(), aligner);

        let err = sync
            .sync_auto(&f.output, &f.unsynced, &f.media)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::AlignmentFailed { .. }));
        assert!(matches!(
            sync.state(),
            SyncState::Completed { success: false, .. }
        ));
        assert!(!sync.is_busy());
    }

    #[tokio::test]
    async fn test_missing_input_leaves_state_untouched() {
        let f = fixture();
        let sync = SubtitleSynchronizer::new(offline_config(), MockAligner::new());

        let err = sync
            .sync_auto(&f.output, &f.dir.path().join("nope.srt"), &f.media)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InputNotFound { .. }));
        assert_eq!(sync.state(), SyncState::Idle);
        assert!(!sync.is_busy());
    }

    #[tokio::test]
    async fn test_second_request_is_busy() {
        let f = fixture();
        let aligner = MockAligner::new();
        aligner.set_hold_until_cancelled(true).await;
        let sync = Arc::new(SubtitleSynchronizer::new(offline_config(), aligner));

        let handle = sync
            .spawn_auto(AutoSyncRequest::new(&f.output, &f.unsynced, &f.media))
            .unwrap();

        let err = sync
            .sync_auto(&f.output, &f.unsynced, &f.media)
            .await
            .unwrap_err();
        match err {
            SyncError::Busy { job_id } => assert_eq!(job_id, handle.job_id()),
            other => panic!("expected busy, got {other:?}"),
        }

        assert_eq!(sync.cancel().unwrap(), handle.job_id());
        let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();
        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert!(matches!(sync.state(), SyncState::Cancelled { .. }));
        assert!(matches!(sync.cancel(), Err(SyncError::NoActiveJob)));
    }

    #[tokio::test]
    async fn test_aborted_job_is_published_cancelled() {
        let f = fixture();
        let aligner = MockAligner::new();
        aligner.set_hold_until_cancelled(true).await;
        let sync = Arc::new(SubtitleSynchronizer::new(offline_config(), aligner));

        let handle = sync
            .spawn_auto(AutoSyncRequest::new(&f.output, &f.unsynced, &f.media))
            .unwrap();
        let job_id = handle.job_id().to_string();

        let mut states = sync.progress().subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            states.wait_for(|s| matches!(s, SyncState::Running { percent: 100, .. })),
        )
        .await
        .unwrap()
        .unwrap();

        handle.abort();
        let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap();

        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert_eq!(sync.state(), SyncState::Cancelled { job_id });
        assert!(!sync.is_busy());
        assert!(matches!(sync.cancel(), Err(SyncError::NoActiveJob)));
    }
}
