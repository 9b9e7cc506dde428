//! Error types for the notify module.

use thiserror::Error;

/// Errors that can occur while notifying the media center.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No media center configured.
    #[error("Media center not configured")]
    NotConfigured,

    /// Request could not be sent.
    #[error("Media center request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Media center answered with an error status.
    #[error("Media center returned {status}: {body}")]
    Status { status: u16, body: String },
}
