use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::notify::MediaCenterConfig;
use crate::sync::SyncConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub media_center: Option<MediaCenterConfig>,
}

/// Download library configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Base path of the download tree (`<root>/<movies|tv>/<title>/**`)
    pub root: PathBuf,
    /// Scratch directory for downloaded subtitle archives
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Language suffix used when placing subtitles (`Movie.heb.srt`)
    #[serde(default = "default_subtitle_language")]
    pub subtitle_language: String,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            work_dir: default_work_dir(),
            subtitle_language: default_subtitle_language(),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("mediadash")
}

fn default_subtitle_language() -> String {
    "heb".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub library: LibraryConfig,
    pub sync: SyncConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_center: Option<SanitizedMediaCenterConfig>,
}

/// Sanitized media-center config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMediaCenterConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub rescan_delay_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            library: config.library.clone(),
            sync: config.sync.clone(),
            media_center: config
                .media_center
                .as_ref()
                .map(|m| SanitizedMediaCenterConfig {
                    url: m.url.clone(),
                    api_key_configured: !m.api_key.is_empty(),
                    rescan_delay_secs: m.rescan_delay_secs,
                }),
        }
    }
}
