//! File system media resolver.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::metrics::{RESOLUTIONS_TOTAL, WALK_ENTRIES_SKIPPED};
use crate::title::{strip_illegal_chars, unescape_html, LibrarySection};

use super::types::{has_extension, MediaFile, MEDIA_EXTENSIONS, PLAYABLE_EXTENSIONS};

/// Finds media files for a title under `<root>/<section>/<title>`.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    root: PathBuf,
}

impl MediaResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a title's downloads land in.
    pub fn title_dir(&self, section: LibrarySection, title: &str) -> PathBuf {
        let title = unescape_html(&strip_illegal_chars(title));
        self.root.join(section.label()).join(title)
    }

    /// Returns the best `.mkv`/`.mp4` for a title.
    ///
    /// Movies pick the largest file so samples and extras lose. TV picks the
    /// first file whose name contains `pattern` (case-insensitive) and needs a
    /// pattern to match anything. A missing directory is `None`, not an error.
    pub fn resolve(
        &self,
        section: LibrarySection,
        title: &str,
        pattern: Option<&str>,
    ) -> Option<MediaFile> {
        let target = self.title_dir(section, title);
        if !target.is_dir() {
            debug!("Title directory {:?} does not exist", target);
            RESOLUTIONS_TOTAL
                .with_label_values(&[section.label(), "not_found"])
                .inc();
            return None;
        }

        let found = match section {
            LibrarySection::Movies => largest_playable(&target),
            LibrarySection::Tv => match pattern {
                Some(p) => first_playable_matching(&target, p),
                None => {
                    warn!("Episode lookup for {:?} without a pattern", target);
                    None
                }
            },
        };

        let result = if found.is_some() { "found" } else { "not_found" };
        RESOLUTIONS_TOTAL
            .with_label_values(&[section.label(), result])
            .inc();

        if let Some(ref file) = found {
            debug!("Resolved {:?} to {:?} ({} bytes)", title, file.path, file.size_bytes);
        }
        found
    }

    /// Lists every known media file stored for a title.
    pub fn find_title_media(
        &self,
        section: LibrarySection,
        title: &str,
        season_episode: Option<&str>,
    ) -> Vec<MediaFile> {
        find_all_media(&self.title_dir(section, title), section, season_episode)
    }
}

/// Recursively lists media files under `dir` with their sizes.
///
/// TV listings keep only names containing `season_episode`; without a hint
/// nothing matches. Unreadable directories are skipped and counted.
pub fn find_all_media(
    dir: &Path,
    section: LibrarySection,
    season_episode: Option<&str>,
) -> Vec<MediaFile> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let needle = season_episode.map(str::to_lowercase);

    media_entries(dir)
        .filter(|entry| has_extension(entry.path(), MEDIA_EXTENSIONS))
        .filter(|entry| match section {
            LibrarySection::Movies => true,
            LibrarySection::Tv => needle
                .as_deref()
                .map(|n| file_name_lower(entry).contains(n))
                .unwrap_or(false),
        })
        .filter_map(|entry| to_media_file(&entry))
        .collect()
}

fn largest_playable(dir: &Path) -> Option<MediaFile> {
    let mut best: Option<MediaFile> = None;
    for entry in media_entries(dir).filter(|e| has_extension(e.path(), PLAYABLE_EXTENSIONS)) {
        let Some(file) = to_media_file(&entry) else {
            continue;
        };
        let current = best.as_ref().map(|b| b.size_bytes).unwrap_or(0);
        if file.size_bytes > current {
            best = Some(file);
        }
    }
    best
}

fn first_playable_matching(dir: &Path, pattern: &str) -> Option<MediaFile> {
    let needle = pattern.to_lowercase();
    media_entries(dir)
        .filter(|e| has_extension(e.path(), PLAYABLE_EXTENSIONS))
        .filter(|e| file_name_lower(e).contains(&needle))
        .find_map(|e| to_media_file(&e))
}

/// Walks `dir` yielding regular files (symlinked files included) in name order.
fn media_entries(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let reason = match e.io_error().map(|io| io.kind()) {
                    Some(ErrorKind::PermissionDenied) => "permission_denied",
                    Some(ErrorKind::NotFound) => "not_found",
                    _ => "other",
                };
                warn!("Skipping unreadable entry {:?}: {}", e.path(), e);
                WALK_ENTRIES_SKIPPED.with_label_values(&[reason]).inc();
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
        })
}

fn file_name_lower(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().to_lowercase()
}

/// Stats the entry; a file that vanished mid-walk is skipped.
fn to_media_file(entry: &DirEntry) -> Option<MediaFile> {
    match std::fs::metadata(entry.path()) {
        Ok(meta) => Some(MediaFile::new(entry.path().to_path_buf(), meta.len())),
        Err(e) => {
            let reason = if e.kind() == ErrorKind::NotFound {
                "not_found"
            } else {
                "other"
            };
            warn!("Skipping {:?}: {}", entry.path(), e);
            WALK_ENTRIES_SKIPPED.with_label_values(&[reason]).inc();
            None
        }
    }
}
