//! Trait definitions for the notify module.

use async_trait::async_trait;

use super::error::NotifyError;

/// A media center that can be asked to rescan its libraries.
#[async_trait]
pub trait MediaCenterNotifier: Send + Sync {
    /// Returns the name of this notifier implementation.
    fn name(&self) -> &str;

    /// Triggers a library rescan.
    async fn rescan_library(&self) -> Result<(), NotifyError>;
}

/// Notifier used when no media center is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl MediaCenterNotifier for NoopNotifier {
    fn name(&self) -> &str {
        "none"
    }

    async fn rescan_library(&self) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}
