//! Configuration for the sync module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for subtitle synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Path to the alignment tool (ffsubsync's `ffs`).
    #[serde(default = "default_aligner_path")]
    pub aligner_path: PathBuf,

    /// Extra arguments passed before the positional ones.
    #[serde(default)]
    pub aligner_args: Vec<String>,

    /// Path to mkvmerge, used to list embedded tracks.
    #[serde(default = "default_mkvmerge_path")]
    pub mkvmerge_path: PathBuf,

    /// Path to mkvextract, used to pull an embedded subtitle track.
    #[serde(default = "default_mkvextract_path")]
    pub mkvextract_path: PathBuf,

    /// Timeout for a single alignment run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Whether to try an embedded subtitle track as the alignment reference.
    #[serde(default = "default_true")]
    pub extract_embedded: bool,
}

fn default_aligner_path() -> PathBuf {
    PathBuf::from("ffs")
}

fn default_mkvmerge_path() -> PathBuf {
    PathBuf::from("mkvmerge")
}

fn default_mkvextract_path() -> PathBuf {
    PathBuf::from("mkvextract")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            aligner_path: default_aligner_path(),
            aligner_args: Vec::new(),
            mkvmerge_path: default_mkvmerge_path(),
            mkvextract_path: default_mkvextract_path(),
            timeout_secs: default_timeout(),
            extract_embedded: true,
        }
    }
}

impl SyncConfig {
    /// Creates a config with a custom aligner command.
    pub fn with_aligner(aligner_path: impl Into<PathBuf>, aligner_args: Vec<String>) -> Self {
        Self {
            aligner_path: aligner_path.into(),
            aligner_args,
            ..Default::default()
        }
    }

    /// Sets the mkvtoolnix binary paths.
    pub fn with_mkvtoolnix(
        mut self,
        mkvmerge_path: impl Into<PathBuf>,
        mkvextract_path: impl Into<PathBuf>,
    ) -> Self {
        self.mkvmerge_path = mkvmerge_path.into();
        self.mkvextract_path = mkvextract_path.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Enables or disables embedded-track extraction.
    pub fn with_extract_embedded(mut self, enabled: bool) -> Self {
        self.extract_embedded = enabled;
        self
    }
}
