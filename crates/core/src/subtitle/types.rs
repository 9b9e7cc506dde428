//! Types for the subtitle module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subtitle text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleFormat {
    /// SubRip: comma decimal separator, no header.
    Srt,
    /// WebVTT: `WEBVTT` header, dot decimal separator. Browser-playable.
    Vtt,
}

impl SubtitleFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "vtt" => Some(Self::Vtt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Srt => "application/x-subrip",
            Self::Vtt => "text/vtt",
        }
    }
}

/// Text encoding detected when a subtitle was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleEncoding {
    Utf8,
    /// UTF-8 with a leading byte-order mark.
    Utf8Bom,
    /// Bytes that were not valid UTF-8; invalid sequences were replaced.
    Lossy,
}

/// A subtitle file on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub path: PathBuf,
    pub format: SubtitleFormat,
    pub encoding: SubtitleEncoding,
}

/// Result of placing a downloaded subtitle next to its media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedSubtitle {
    pub srt: SubtitleTrack,
    pub vtt: SubtitleTrack,
    /// Media file the subtitle was named after.
    pub media_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SubtitleFormat::from_path(Path::new("Movie.heb.SRT")),
            Some(SubtitleFormat::Srt)
        );
        assert_eq!(
            SubtitleFormat::from_path(Path::new("Movie.vtt")),
            Some(SubtitleFormat::Vtt)
        );
        assert_eq!(SubtitleFormat::from_path(Path::new("Movie.ass")), None);
        assert_eq!(SubtitleFormat::Vtt.mime_type(), "text/vtt");
    }
}
