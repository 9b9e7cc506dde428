//! Testing utilities and mock implementations.
//!
//! This module provides a mock aligner so sync behavior (progress, busy
//! rejection, cancellation) can be tested without ffsubsync installed, plus
//! fixtures that lay out a download tree on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediadash_core::testing::{fixtures, MockAligner};
//!
//! let root = tempfile::TempDir::new()?;
//! let media = fixtures::media_file(root.path(), "movies/Inception/Inception.mkv", 4096);
//! let aligner = MockAligner::new();
//! ```

mod mock_aligner;

pub use mock_aligner::MockAligner;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};

    /// Creates `root/relative` with the given apparent size.
    ///
    /// The file is sparse, so multi-gigabyte sizes cost no disk space.
    pub fn media_file(root: &Path, relative: &str, size_bytes: u64) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        let file = File::create(&path).expect("create fixture file");
        file.set_len(size_bytes).expect("size fixture file");
        path
    }

    /// Builds a SubRip document from `(start, end, text)` cues.
    pub fn srt_document(cues: &[(&str, &str, &str)]) -> String {
        cues.iter()
            .enumerate()
            .map(|(i, (start, end, text))| format!("{}\n{} --> {}\n{}\n", i + 1, start, end, text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Writes a SubRip document and returns its path.
    pub fn srt_file(dir: &Path, name: &str, cues: &[(&str, &str, &str)]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, srt_document(cues)).expect("write fixture subtitle");
        path
    }
}
