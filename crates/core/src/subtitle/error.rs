//! Error types for the subtitle module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting or placing subtitles.
#[derive(Debug, Error)]
pub enum SubtitleError {
    /// Source subtitle file not found.
    #[error("Subtitle file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// No media file to attach the subtitle to.
    #[error("No matching media file found for {title}")]
    MediaNotFound { title: String },

    /// Archive did not contain a SubRip file.
    #[error("No .srt file found in archive {path}")]
    NoSubtitleInArchive { path: PathBuf },

    /// Archive could not be read.
    #[error("Failed to read subtitle archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Failed to move a file into place.
    #[error("Failed to move {source_path} to {destination}")]
    MoveFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubtitleError {
    /// Creates an archive error.
    pub fn archive(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::Archive {
            path,
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::MoveFailed { .. })
    }
}
