//! Embedded subtitle extraction via mkvtoolnix.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::config::SyncConfig;
use super::error::SyncError;

static SUBTITLE_TRACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Track ID (\d+): subtitles \(SubRip/SRT\)").expect("valid track regex")
});

/// Sidecar path used for a track extracted from `media`.
pub fn embedded_sidecar_path(media: &Path) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    media.with_file_name(format!("{}.embedded.srt", stem))
}

/// Track ids of SubRip subtitle tracks in `mkvmerge -i` output.
pub fn parse_subtitle_tracks(identify_output: &str) -> Vec<u32> {
    identify_output
        .lines()
        .filter_map(|line| SUBTITLE_TRACK.captures(line.trim()))
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Pulls SubRip tracks out of Matroska files.
#[derive(Debug, Clone)]
pub struct MkvDemuxer {
    mkvmerge_path: PathBuf,
    mkvextract_path: PathBuf,
}

impl MkvDemuxer {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            mkvmerge_path: config.mkvmerge_path.clone(),
            mkvextract_path: config.mkvextract_path.clone(),
        }
    }

    /// Lists SubRip track ids in `media`.
    pub async fn subtitle_tracks(&self, media: &Path) -> Result<Vec<u32>, SyncError> {
        let output = Command::new(&self.mkvmerge_path)
            .arg("-i")
            .arg(media)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SyncError::tool_unavailable("mkvmerge", &self.mkvmerge_path, e))?;

        // Exit code 1 means warnings only.
        if !output.status.success() && output.status.code() != Some(1) {
            return Err(SyncError::DemuxFailed {
                reason: format!(
                    "mkvmerge exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).trim()
                ),
            });
        }

        Ok(parse_subtitle_tracks(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Extracts the first SubRip track of `media` to `destination`.
    pub async fn extract_first_srt(
        &self,
        media: &Path,
        destination: &Path,
    ) -> Result<PathBuf, SyncError> {
        let tracks = self.subtitle_tracks(media).await?;
        let track = *tracks.first().ok_or_else(|| SyncError::DemuxFailed {
            reason: format!("no SubRip track in {}", media.display()),
        })?;

        debug!(
            "Extracting subtitle track {} from {} to {}",
            track,
            media.display(),
            destination.display()
        );

        let output = Command::new(&self.mkvextract_path)
            .arg(media)
            .arg("tracks")
            .arg(format!("{}:{}", track, destination.display()))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SyncError::tool_unavailable("mkvextract", &self.mkvextract_path, e))?;

        if !output.status.success() && output.status.code() != Some(1) {
            return Err(SyncError::DemuxFailed {
                reason: format!(
                    "mkvextract exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stdout).trim()
                ),
            });
        }

        if !destination.exists() {
            return Err(SyncError::DemuxFailed {
                reason: format!("mkvextract produced no file at {}", destination.display()),
            });
        }

        Ok(destination.to_path_buf())
    }
}
