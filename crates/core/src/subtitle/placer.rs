//! Places downloaded subtitles next to their media files.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::convert::{convert_file, decode_subtitle, read_subtitle};
use super::error::SubtitleError;
use super::types::{PlacedSubtitle, SubtitleEncoding, SubtitleFormat, SubtitleTrack};
use crate::metrics::SUBTITLES_PLACED;
use crate::notify::{schedule_rescan, MediaCenterNotifier};
use crate::resolver::{MediaFile, MediaResolver};
use crate::title::{extract_episode_marker, normalize_title, LibrarySection};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A downloaded subtitle waiting to be placed.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    /// Display title as shown to the user, e.g. `The Office S02E05`.
    pub title: String,
    /// Release name the subtitle was made for; its `sNNeNN` marker wins over the title's.
    pub release_name: Option<String>,
    /// Zip archive or raw SubRip bytes.
    pub payload: Vec<u8>,
}

impl PlacementRequest {
    pub fn new(title: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            release_name: None,
            payload,
        }
    }

    pub fn with_release_name(mut self, release_name: impl Into<String>) -> Self {
        self.release_name = Some(release_name.into());
        self
    }
}

/// Subtitle staged in the work directory.
struct Staged {
    srt: PathBuf,
    archive: Option<PathBuf>,
    encoding: SubtitleEncoding,
}

/// Moves subtitles into the library and keeps a WebVTT copy beside them.
pub struct SubtitlePlacer {
    resolver: MediaResolver,
    work_dir: PathBuf,
    language: String,
    notifier: Arc<dyn MediaCenterNotifier>,
    rescan_delay: Duration,
}

impl SubtitlePlacer {
    pub fn new(
        resolver: MediaResolver,
        work_dir: impl Into<PathBuf>,
        language: impl Into<String>,
        notifier: Arc<dyn MediaCenterNotifier>,
    ) -> Self {
        Self {
            resolver,
            work_dir: work_dir.into(),
            language: language.into(),
            notifier,
            rescan_delay: Duration::from_secs(10),
        }
    }

    pub fn with_rescan_delay(mut self, delay: Duration) -> Self {
        self.rescan_delay = delay;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Sidecar path for a subtitle in this placer's language.
    pub fn sidecar_path(&self, media: &MediaFile, format: SubtitleFormat) -> PathBuf {
        media
            .dir()
            .join(format!("{}.{}.{}", media.stem(), self.language, format.extension()))
    }

    /// Places a downloaded subtitle and schedules a library rescan.
    pub async fn place(&self, request: PlacementRequest) -> Result<PlacedSubtitle, SubtitleError> {
        let media = self.resolve_media(&request).await?;
        debug!("Placing subtitle for {:?} next to {:?}", request.title, media.path);

        fs::create_dir_all(&self.work_dir).await?;
        let staged = self.stage(&request.payload).await?;

        let installed = self.install(&media, &staged).await;
        let mut leftovers = vec![staged.srt.as_path()];
        leftovers.extend(staged.archive.as_deref());
        remove_staged(&leftovers).await;
        let (srt_path, vtt) = installed?;

        info!("Placed subtitle {:?}", srt_path);
        SUBTITLES_PLACED.inc();
        schedule_rescan(Arc::clone(&self.notifier), self.rescan_delay);

        Ok(PlacedSubtitle {
            srt: SubtitleTrack {
                path: srt_path,
                format: SubtitleFormat::Srt,
                encoding: staged.encoding,
            },
            vtt,
            media_path: media.path,
        })
    }

    /// Moves the staged subtitle beside `media` and writes its WebVTT copy.
    async fn install(
        &self,
        media: &MediaFile,
        staged: &Staged,
    ) -> Result<(PathBuf, SubtitleTrack), SubtitleError> {
        let srt_path = self.sidecar_path(media, SubtitleFormat::Srt);
        move_file(&staged.srt, &srt_path).await?;
        let vtt = convert_file(&srt_path, &self.sidecar_path(media, SubtitleFormat::Vtt)).await?;
        Ok((srt_path, vtt))
    }

    async fn resolve_media(&self, request: &PlacementRequest) -> Result<MediaFile, SubtitleError> {
        let normalized = normalize_title(&request.title);
        let section = normalized.context.section();
        let pattern = match section {
            LibrarySection::Movies => None,
            LibrarySection::Tv => request
                .release_name
                .as_deref()
                .and_then(extract_episode_marker)
                .map(str::to_string)
                .or_else(|| normalized.context.marker()),
        };

        let resolver = self.resolver.clone();
        let title = normalized.title.clone();
        let found = tokio::task::spawn_blocking(move || {
            resolver.resolve(section, &title, pattern.as_deref())
        })
        .await
        .map_err(|e| SubtitleError::Io(std::io::Error::other(e)))?;

        found.ok_or_else(|| SubtitleError::MediaNotFound {
            title: request.title.clone(),
        })
    }

    /// Writes the payload into the work dir, unpacking it if it is a zip.
    async fn stage(&self, payload: &[u8]) -> Result<Staged, SubtitleError> {
        let id = Uuid::new_v4();
        let srt = self.work_dir.join(format!("{}.srt", id));

        if !payload.starts_with(ZIP_MAGIC) {
            if let Err(e) = fs::write(&srt, payload).await {
                remove_staged(&[srt.as_path()]).await;
                return Err(e.into());
            }
            let (_, encoding) = decode_subtitle(payload);
            return Ok(Staged {
                srt,
                archive: None,
                encoding,
            });
        }

        let archive = self.work_dir.join(format!("{}.zip", id));
        let bytes = match unpack(payload, &archive, &srt).await {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_staged(&[archive.as_path(), srt.as_path()]).await;
                return Err(e);
            }
        };

        let (_, encoding) = decode_subtitle(&bytes);
        Ok(Staged {
            srt,
            archive: Some(archive),
            encoding,
        })
    }
}

/// Writes a zip payload to `archive` and extracts its first SubRip entry to `srt`.
async fn unpack(payload: &[u8], archive: &Path, srt: &Path) -> Result<Vec<u8>, SubtitleError> {
    fs::write(archive, payload).await?;

    let (archive_path, srt_path) = (archive.to_path_buf(), srt.to_path_buf());
    tokio::task::spawn_blocking(move || extract_first_srt(&archive_path, &srt_path))
        .await
        .map_err(|e| SubtitleError::Io(std::io::Error::other(e)))?
}

/// Removes work-dir files, ignoring ones that are already gone.
async fn remove_staged(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed staged file {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove staged file {:?}: {}", path, e),
        }
    }
}

/// Copies the first `.srt` entry of a zip to `destination`, returning its bytes.
///
/// Only the entry's content is used; its path inside the archive is ignored.
fn extract_first_srt(archive_path: &Path, destination: &Path) -> Result<Vec<u8>, SubtitleError> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| SubtitleError::archive(archive_path.to_path_buf(), e.to_string()))?;

    let mut chosen = None;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| SubtitleError::archive(archive_path.to_path_buf(), e.to_string()))?;
        if entry.is_file() && entry.name().to_ascii_lowercase().ends_with(".srt") {
            chosen = Some(i);
            break;
        }
    }

    let index = chosen.ok_or_else(|| SubtitleError::NoSubtitleInArchive {
        path: archive_path.to_path_buf(),
    })?;

    let mut entry = archive
        .by_index(index)
        .map_err(|e| SubtitleError::archive(archive_path.to_path_buf(), e.to_string()))?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    std::fs::write(destination, &bytes)?;

    Ok(bytes)
}

/// Renames `source` to `destination`, copying across filesystems.
async fn move_file(source: &Path, destination: &Path) -> Result<(), SubtitleError> {
    let move_failed = |error: std::io::Error| SubtitleError::MoveFailed {
        source_path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };

    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        // EXDEV is 18 on Linux.
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            fs::copy(source, destination).await.map_err(move_failed)?;
            fs::remove_file(source).await.map_err(move_failed)?;
            Ok(())
        }
        Err(e) => Err(move_failed(e)),
    }
}

/// Lists `.srt`/`.vtt` files beside `media_path` that belong to it.
///
/// A subtitle belongs to a media file when its name starts with the media's
/// stem followed by a dot.
pub async fn list_sidecar_subtitles(media_path: &Path) -> Result<Vec<SubtitleTrack>, SubtitleError> {
    let Some(dir) = media_path.parent() else {
        return Ok(Vec::new());
    };
    let prefix = match media_path.file_stem() {
        Some(stem) => format!("{}.", stem.to_string_lossy()),
        None => return Ok(Vec::new()),
    };

    let mut tracks = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(format) = SubtitleFormat::from_path(&path) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || !entry.file_type().await?.is_file() {
            continue;
        }
        let (_, encoding) = read_subtitle(&path).await?;
        tracks.push(SubtitleTrack {
            path,
            format,
            encoding,
        });
    }

    tracks.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(tracks)
}
