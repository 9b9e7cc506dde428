//! Subtitle synchronization.
//!
//! Two ways to fix a subtitle's timing:
//! - **Automatic**: an external aligner (ffsubsync) compares the subtitle with
//!   a reference, either a SubRip track pulled out of the container or the
//!   media's audio. Long-running, reports progress, can be cancelled.
//! - **Fixed offset**: every cue is shifted by a whole number of seconds.
//!
//! Only one automatic job runs per [`SubtitleSynchronizer`]. A second request
//! while one is active fails with [`SyncError::Busy`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mediadash_core::sync::{FfsubsyncAligner, SubtitleSynchronizer, SyncConfig};
//!
//! let sync = SubtitleSynchronizer::new(SyncConfig::default(), FfsubsyncAligner::with_defaults());
//! let report = sync.sync_auto(&output, &unsynced, &media).await?;
//! ```

mod config;
mod demux;
mod error;
mod ffsubsync;
mod offset;
mod progress;
mod slot;
mod synchronizer;
mod traits;
mod types;

pub use config::SyncConfig;
pub use demux::{embedded_sidecar_path, parse_subtitle_tracks, MkvDemuxer};
pub use error::SyncError;
pub use ffsubsync::{parse_percent, FfsubsyncAligner};
pub use offset::sync_offset;
pub use progress::{ProgressChannel, ProgressReporter};
pub use slot::CancelSignal;
pub use synchronizer::{AutoSyncRequest, SubtitleSynchronizer, SyncHandle};
pub use traits::SubtitleAligner;
pub use types::{
    AlignmentJob, AlignmentReference, AlignmentResult, OffsetReport, SyncReport, SyncState,
};
