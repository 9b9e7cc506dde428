//! Types for the resolver module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions considered by [`super::MediaResolver::resolve`].
pub const PLAYABLE_EXTENSIONS: &[&str] = &["mkv", "mp4"];

/// Extensions listed by [`super::find_all_media`].
pub const MEDIA_EXTENSIONS: &[&str] = &[
    // Video
    "mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpeg", "mpg", "mts", "m2ts", "ts",
    "vob", "3gp", "3g2", "ogv", "mxf", "rmvb", "asf", "divx",
    // Audio
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus",
];

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A media file discovered on disk.
///
/// Never cached: every lookup walks the tree again since downloads keep arriving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    /// File name without directories.
    pub name: String,
    pub size_bytes: u64,
    /// Size in GiB rounded to two decimals.
    pub size_gb: f64,
}

impl MediaFile {
    pub fn new(path: PathBuf, size_bytes: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            size_bytes,
            size_gb: round_gb(size_bytes),
        }
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory that holds the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn round_gb(size_bytes: u64) -> f64 {
    (size_bytes as f64 / BYTES_PER_GB * 100.0).round() / 100.0
}

/// Returns true when the path's extension is in `allowed` (case-insensitive).
pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            allowed.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_file_size_gb() {
        let file = MediaFile::new(PathBuf::from("/m/Inception.mkv"), 2 * 1024 * 1024 * 1024);
        assert_eq!(file.size_gb, 2.0);
        assert_eq!(file.name, "Inception.mkv");
        assert_eq!(file.stem(), "Inception");
        assert_eq!(file.dir(), Path::new("/m"));

        let small = MediaFile::new(PathBuf::from("a.mp4"), 10 * 1024 * 1024);
        assert_eq!(small.size_gb, 0.01);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/B.MKV"), PLAYABLE_EXTENSIONS));
        assert!(has_extension(Path::new("song.flac"), MEDIA_EXTENSIONS));
        assert!(!has_extension(Path::new("notes.txt"), MEDIA_EXTENSIONS));
        assert!(!has_extension(Path::new("noext"), PLAYABLE_EXTENSIONS));
    }
}
