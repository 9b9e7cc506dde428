//! Sync lifecycle integration tests.
//!
//! These tests drive the synchronizer with a mock aligner:
//! - Single active job (Busy on a second request)
//! - Cancellation and the resulting state
//! - Progress stream ordering and termination
//! - Fixed-offset sync end to end

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tempfile::TempDir;

use mediadash_core::{
    sync::{AutoSyncRequest, SyncConfig},
    sync_offset,
    testing::{fixtures, MockAligner},
    AlignmentReference, SubtitleSynchronizer, SyncError, SyncState,
};

/// Test helper holding a synchronizer and its on-disk inputs.
struct TestHarness {
    sync: Arc<SubtitleSynchronizer<MockAligner>>,
    aligner: MockAligner,
    media: PathBuf,
    unsynced: PathBuf,
    output: PathBuf,
    _dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let media = fixtures::media_file(dir.path(), "movies/Inception/Inception.mkv", 1024);
        let unsynced = fixtures::srt_file(
            dir.path(),
            "Inception.unsynced.srt",
            &[("00:01:02,500", "00:01:05,000", "Dreams feel real")],
        );
        let output = dir.path().join("movies/Inception/Inception.heb.srt");

        let config = SyncConfig::default()
            .with_mkvtoolnix("/nonexistent/mkvmerge", "/nonexistent/mkvextract");
        let aligner = MockAligner::new();
        let sync = Arc::new(SubtitleSynchronizer::new(config, aligner.clone()));

        Self {
            sync,
            aligner,
            media,
            unsynced,
            output,
            _dir: dir,
        }
    }

    fn request(&self) -> AutoSyncRequest {
        AutoSyncRequest::new(&self.output, &self.unsynced, &self.media)
    }
}

#[tokio::test]
async fn test_second_sync_is_rejected_while_running() {
    let h = TestHarness::new();
    h.aligner.set_hold_until_cancelled(true).await;

    let first = h.sync.spawn_auto(h.request()).expect("first job starts");
    assert!(h.sync.is_busy());

    for _ in 0..3 {
        match h.sync.spawn_auto(h.request()) {
            Err(SyncError::Busy { job_id }) => assert_eq!(job_id, first.job_id()),
            other => panic!("expected busy, got {:?}", other.map(|h| h.job_id().to_string())),
        }
    }

    // Wait until the aligner holds the job before cancelling it.
    let mut states = h.sync.progress().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| matches!(s, SyncState::Running { percent: 100, .. })),
    )
    .await
    .expect("aligner reports its last step")
    .unwrap();

    h.sync.cancel().expect("cancel running job");
    let result = tokio::time::timeout(Duration::from_secs(5), first.wait())
        .await
        .expect("job ends after cancel");
    assert!(matches!(result, Err(SyncError::Cancelled)));

    // Slot is free again.
    h.aligner.set_hold_until_cancelled(false).await;
    let report = h
        .sync
        .spawn_auto(h.request())
        .expect("slot released")
        .wait()
        .await
        .expect("second job succeeds");
    assert_eq!(report.reference, AlignmentReference::Media(h.media.clone()));
    assert_eq!(h.aligner.recorded_jobs().await.len(), 2);
}

#[tokio::test]
async fn test_cancel_without_job() {
    let h = TestHarness::new();
    assert!(matches!(h.sync.cancel(), Err(SyncError::NoActiveJob)));
    assert_eq!(h.sync.state(), SyncState::Idle);
}

#[tokio::test]
async fn test_cancelled_state_is_published() {
    let h = TestHarness::new();
    h.aligner
        .set_steps(vec![10, 20], Duration::from_millis(5))
        .await;
    h.aligner.set_hold_until_cancelled(true).await;

    let handle = h.sync.spawn_auto(h.request()).unwrap();
    let job_id = handle.job_id().to_string();

    let mut states = h.sync.progress().subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| matches!(s, SyncState::Running { percent: 20, .. })),
    )
    .await
    .expect("progress reaches 20")
    .unwrap();

    h.sync.cancel().unwrap();
    let _ = handle.wait().await;

    assert_eq!(h.sync.state(), SyncState::Cancelled { job_id });
    assert!(!h.sync.is_busy());
}

#[tokio::test]
async fn test_report_stream_is_monotonic_and_ends() {
    let h = TestHarness::new();
    h.aligner
        .set_steps(vec![5, 25, 25, 60, 40, 100], Duration::from_millis(5))
        .await;

    let report = h.sync.report();
    let handle = h.sync.spawn_auto(h.request()).unwrap();

    let seen: Vec<u8> = tokio::time::timeout(Duration::from_secs(5), report.collect())
        .await
        .expect("stream ends when the job finishes");

    assert!(seen.windows(2).all(|w| w[0] < w[1]), "not increasing: {seen:?}");
    assert!(seen.iter().all(|p| *p <= 100));
    assert!(!seen.contains(&40));

    handle.wait().await.unwrap();
    assert!(matches!(
        h.sync.state(),
        SyncState::Completed { success: true, .. }
    ));
}

#[tokio::test]
async fn test_failed_alignment_reports_failure() {
    let h = TestHarness::new();
    h.aligner
        .set_next_error(SyncError::alignment_failed(Some(2), Some("boom".into())))
        .await;

    let err = h
        .sync
        .sync_auto(&h.output, &h.unsynced, &h.media)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::AlignmentFailed { exit_code: Some(2), .. }));
    assert!(matches!(
        h.sync.state(),
        SyncState::Completed { success: false, .. }
    ));
    assert!(!h.output.exists());
}

#[tokio::test]
async fn test_offset_sync_end_to_end() {
    let h = TestHarness::new();
    let shifted = h.unsynced.with_file_name("shifted.srt");

    let report = sync_offset(&shifted, &h.unsynced, 10).await.unwrap();
    assert_eq!(report.cues_shifted, 1);
    let text = std::fs::read_to_string(&shifted).unwrap();
    assert!(text.contains("00:01:12,500 --> 00:01:15,000"));

    // Shifting back restores the original.
    let restored = h.unsynced.with_file_name("restored.srt");
    sync_offset(&restored, &shifted, -10).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&restored).unwrap(),
        std::fs::read_to_string(&h.unsynced).unwrap()
    );

    // Fixed offsets never touch the auto-sync slot.
    assert_eq!(h.sync.state(), SyncState::Idle);
}
