//! Progress channel shared between a running sync job and its observers.
//!
//! The job side publishes through [`ProgressReporter`]; any number of readers
//! observe through [`ProgressChannel::report`] or [`ProgressChannel::state`].
//! Readers only ever see the latest value, so intermediate percentages may be
//! skipped, but they never go backwards within a job.

use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::watch;

use super::types::SyncState;

/// Single-writer, multi-reader view of the sync slot state.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    tx: Arc<watch::Sender<SyncState>>,
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncState::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SyncState {
        self.tx.borrow().clone()
    }

    /// Subscribes to raw state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.tx.subscribe()
    }

    /// Marks a job as started at 0%.
    pub(crate) fn start(&self, job_id: &str) {
        self.tx.send_replace(SyncState::Running {
            job_id: job_id.to_string(),
            percent: 0,
        });
    }

    /// Publishes the terminal state of a job.
    pub(crate) fn finish(&self, state: SyncState) {
        debug_assert!(state.is_terminal());
        self.tx.send_replace(state);
    }

    /// Marks `job_id` cancelled if it is still shown as running.
    ///
    /// Returns false when the job already published a terminal state or a
    /// newer job owns the channel.
    pub(crate) fn abandon(&self, job_id: &str) -> bool {
        self.tx.send_if_modified(|state| {
            let running =
                matches!(state, SyncState::Running { job_id: current, .. } if current == job_id);
            if running {
                *state = SyncState::Cancelled {
                    job_id: job_id.to_string(),
                };
            }
            running
        })
    }

    /// Creates the writer handle for a job.
    pub fn reporter(&self, job_id: &str) -> ProgressReporter {
        ProgressReporter {
            tx: Arc::clone(&self.tx),
            job_id: job_id.to_string(),
        }
    }

    /// Stream of percentages for the current or next job.
    ///
    /// Yields the latest percentage each time it changes and ends once that
    /// job reaches a terminal state. When subscribed after a job already
    /// finished, the stream waits for the next job instead of ending
    /// immediately.
    pub fn report(&self) -> impl Stream<Item = u8> + Send + 'static {
        let rx = self.tx.subscribe();
        let stale_job = {
            let current = rx.borrow();
            if current.is_terminal() {
                current.job_id().map(str::to_string)
            } else {
                None
            }
        };

        let state = ReportState {
            rx,
            stale_job,
            fresh: true,
        };

        stream::unfold(state, |mut st| async move {
            loop {
                if !st.fresh && st.rx.changed().await.is_err() {
                    return None;
                }
                st.fresh = false;

                let current = st.rx.borrow_and_update().clone();
                match current {
                    SyncState::Running { percent, .. } => return Some((percent, st)),
                    SyncState::Idle => continue,
                    SyncState::Completed { ref job_id, .. } | SyncState::Cancelled { ref job_id } => {
                        if st.stale_job.as_deref() == Some(job_id.as_str()) {
                            continue;
                        }
                        return None;
                    }
                }
            }
        })
    }
}

struct ReportState {
    rx: watch::Receiver<SyncState>,
    stale_job: Option<String>,
    fresh: bool,
}

/// Writer handle held by the job that owns the slot.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<SyncState>>,
    job_id: String,
}

impl ProgressReporter {
    /// Publishes `percent`, clamped to 100.
    ///
    /// Ignored unless it is higher than the last published value for this
    /// job, or if the job is no longer running.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|state| match state {
            SyncState::Running {
                job_id,
                percent: current,
            } if *job_id == self.job_id && percent > *current => {
                *current = percent;
                true
            }
            _ => false,
        });
    }

    /// Last published percentage for this job.
    pub fn current(&self) -> u8 {
        match &*self.tx.borrow() {
            SyncState::Running { job_id, percent } if *job_id == self.job_id => *percent,
            _ => 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}
