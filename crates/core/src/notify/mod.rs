//! Media-center notifications.
//!
//! After a subtitle lands next to a media file the media center has to rescan
//! before it shows up. Rescans are fire-and-forget: failures are logged and
//! counted, never returned to whoever placed the subtitle.

mod config;
mod error;
mod jellyfin;
mod traits;

pub use config::MediaCenterConfig;
pub use error::NotifyError;
pub use jellyfin::JellyfinNotifier;
pub use traits::{MediaCenterNotifier, NoopNotifier};

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::RESCANS_TOTAL;

/// Factory function to create a notifier from config
pub fn create_notifier(
    config: Option<&MediaCenterConfig>,
) -> Result<Arc<dyn MediaCenterNotifier>, NotifyError> {
    match config {
        Some(cfg) => Ok(Arc::new(JellyfinNotifier::new(cfg)?)),
        None => Ok(Arc::new(NoopNotifier)),
    }
}

/// Spawns a rescan after `delay`. The returned handle may be dropped.
pub fn schedule_rescan(notifier: Arc<dyn MediaCenterNotifier>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match notifier.rescan_library().await {
            Ok(()) => {
                info!("Requested library rescan from {}", notifier.name());
                RESCANS_TOTAL.with_label_values(&["success"]).inc();
            }
            Err(NotifyError::NotConfigured) => {
                debug!("No media center configured, skipping rescan");
            }
            Err(e) => {
                warn!("Failed to notify {}: {}", notifier.name(), e);
                RESCANS_TOTAL.with_label_values(&["error"]).inc();
            }
        }
    })
}
