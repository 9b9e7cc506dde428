//! Configuration for media-center notifications.

use serde::{Deserialize, Serialize};

/// Jellyfin connection used to trigger library rescans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCenterConfig {
    /// Base URL (e.g., "http://localhost:8096")
    pub url: String,
    /// API key
    pub api_key: String,
    /// Scheduled task that scans all libraries.
    #[serde(default = "default_scan_task_id")]
    pub scan_task_id: String,
    /// Delay before a rescan fires after a subtitle is placed.
    #[serde(default = "default_rescan_delay")]
    pub rescan_delay_secs: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_scan_task_id() -> String {
    "7738148ffcd07979c7ceb148e06b3aed".to_string()
}

fn default_rescan_delay() -> u64 {
    10
}

fn default_timeout() -> u64 {
    10
}

impl MediaCenterConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            scan_task_id: default_scan_task_id(),
            rescan_delay_secs: default_rescan_delay(),
            timeout_secs: default_timeout(),
        }
    }

    /// Sets the rescan delay.
    pub fn with_rescan_delay(mut self, secs: u64) -> Self {
        self.rescan_delay_secs = secs;
        self
    }
}
