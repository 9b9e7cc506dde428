//! Process-wide single-job slot with cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::info;

use super::error::SyncError;
use super::progress::ProgressChannel;

#[derive(Debug, Default)]
struct ActiveJob {
    job_id: Option<String>,
    cancel_tx: Option<oneshot::Sender<()>>,
}

/// At most one sync job holds this slot at a time.
#[derive(Debug, Default)]
pub(crate) struct JobSlot {
    busy: AtomicBool,
    active: Mutex<ActiveJob>,
}

impl JobSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, ActiveJob> {
        // State is two plain fields, a poisoned lock still holds consistent data.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claims the slot for `job_id`, failing with `Busy` if it is held.
    ///
    /// If the guard is dropped while `progress` still shows the job running,
    /// the job is published as cancelled.
    pub(crate) fn try_acquire(
        self: &Arc<Self>,
        job_id: &str,
        progress: &ProgressChannel,
    ) -> Result<(SlotGuard, CancelSignal), SyncError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let running = self.active().job_id.clone().unwrap_or_default();
            return Err(SyncError::Busy { job_id: running });
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        {
            let mut active = self.active();
            active.job_id = Some(job_id.to_string());
            active.cancel_tx = Some(cancel_tx);
        }

        Ok((
            SlotGuard {
                slot: Arc::clone(self),
                progress: progress.clone(),
                job_id: job_id.to_string(),
            },
            CancelSignal {
                rx: Some(cancel_rx),
                fired: false,
            },
        ))
    }

    /// Signals the running job to stop.
    pub(crate) fn cancel(&self) -> Result<String, SyncError> {
        let mut active = self.active();
        let job_id = active.job_id.clone().ok_or(SyncError::NoActiveJob)?;
        let tx = active.cancel_tx.take().ok_or(SyncError::NoActiveJob)?;
        tx.send(()).map_err(|_| SyncError::NoActiveJob)?;
        Ok(job_id)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the slot on drop.
#[derive(Debug)]
pub(crate) struct SlotGuard {
    slot: Arc<JobSlot>,
    progress: ProgressChannel,
    job_id: String,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // A job dropped mid-run never reached `finish`.
        if self.progress.abandon(&self.job_id) {
            info!("Sync job {} dropped before finishing", self.job_id);
        }
        {
            let mut active = self.slot.active();
            active.job_id = None;
            active.cancel_tx = None;
        }
        self.slot.busy.store(false, Ordering::Release);
    }
}

/// Receiving side of a cancel request.
#[derive(Debug)]
pub struct CancelSignal {
    rx: Option<oneshot::Receiver<()>>,
    fired: bool,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self {
            rx: None,
            fired: false,
        }
    }

    /// Creates a linked sender and signal.
    pub fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                fired: false,
            },
        )
    }

    /// Resolves once cancellation is requested.
    ///
    /// A dropped sender means the job finished, which is not a cancellation,
    /// so this then stays pending.
    pub async fn cancelled(&mut self) {
        if self.fired {
            return;
        }
        if let Some(rx) = self.rx.as_mut() {
            let received = rx.await.is_ok();
            self.rx = None;
            if received {
                self.fired = true;
                return;
            }
        }
        std::future::pending::<()>().await;
    }

    /// Non-blocking check.
    pub fn is_cancelled(&mut self) -> bool {
        if !self.fired {
            if let Some(rx) = self.rx.as_mut() {
                if rx.try_recv().is_ok() {
                    self.fired = true;
                    self.rx = None;
                }
            }
        }
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::SyncState;
    use std::time::Duration;

    #[test]
    fn test_second_acquire_is_busy() {
        let slot = Arc::new(JobSlot::new());
        let progress = ProgressChannel::new();
        let (_guard, _cancel) = slot.try_acquire("a", &progress).unwrap();

        match slot.try_acquire("b", &progress) {
            Err(SyncError::Busy { job_id }) => assert_eq!(job_id, "a"),
            other => panic!("expected busy, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_guard_drop_releases() {
        let slot = Arc::new(JobSlot::new());
        let progress = ProgressChannel::new();
        let (guard, _cancel) = slot.try_acquire("a", &progress).unwrap();
        assert!(slot.is_busy());
        drop(guard);
        assert!(!slot.is_busy());
        assert!(slot.try_acquire("b", &progress).is_ok());
    }

    #[test]
    fn test_dropped_guard_publishes_cancelled() {
        let slot = Arc::new(JobSlot::new());
        let progress = ProgressChannel::new();
        let (guard, _cancel) = slot.try_acquire("a", &progress).unwrap();
        progress.start("a");
        progress.reporter("a").report(40);

        drop(guard);

        assert_eq!(
            progress.state(),
            SyncState::Cancelled {
                job_id: "a".into()
            }
        );
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_dropped_guard_keeps_finished_state() {
        let slot = Arc::new(JobSlot::new());
        let progress = ProgressChannel::new();
        let (guard, _cancel) = slot.try_acquire("a", &progress).unwrap();
        progress.start("a");
        let done = SyncState::Completed {
            job_id: "a".into(),
            success: true,
        };
        progress.finish(done.clone());

        drop(guard);
        assert_eq!(progress.state(), done);
    }

    #[test]
    fn test_cancel_without_job() {
        let slot = JobSlot::new();
        assert!(matches!(slot.cancel(), Err(SyncError::NoActiveJob)));
    }

    #[tokio::test]
    async fn test_cancel_fires_signal() {
        let slot = Arc::new(JobSlot::new());
        let progress = ProgressChannel::new();
        let (_guard, mut cancel) = slot.try_acquire("a", &progress).unwrap();

        assert_eq!(slot.cancel().unwrap(), "a");
        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .unwrap();

        // Already requested.
        assert!(matches!(slot.cancel(), Err(SyncError::NoActiveJob)));
    }

    #[tokio::test]
    async fn test_dropped_sender_is_not_cancellation() {
        let (tx, mut cancel) = CancelSignal::pair();
        drop(tx);
        let fired = tokio::time::timeout(Duration::from_millis(50), cancel.cancelled()).await;
        assert!(fired.is_err());
    }
}
