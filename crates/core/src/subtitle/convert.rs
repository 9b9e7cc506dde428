//! SubRip to WebVTT conversion.

use std::path::Path;
use tracing::{debug, warn};

use super::error::SubtitleError;
use super::types::{SubtitleEncoding, SubtitleFormat, SubtitleTrack};

/// First line of every WebVTT file.
pub const VTT_HEADER: &str = "WEBVTT";

/// Delimiter between a cue's start and end timestamps.
pub const CUE_ARROW: &str = "-->";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Converts SubRip lines to WebVTT lines.
///
/// Emits the header and a blank line, then every input line. Commas become
/// dots on timing lines only, so cue text keeps its punctuation.
pub fn srt_to_vtt<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(VTT_HEADER.to_string());
    out.push(String::new());
    out.extend(lines.iter().map(|l| convert_line(l.as_ref())));
    out
}

/// Rewrites a single line; non-timing lines pass through.
pub fn convert_line(line: &str) -> String {
    if line.contains(CUE_ARROW) {
        line.replace(',', ".")
    } else {
        line.to_string()
    }
}

/// Converts a whole SubRip document.
///
/// The WebVTT output always uses `\n` line endings, whatever the input used.
pub fn convert_text(srt: &str) -> String {
    let lines: Vec<&str> = srt.lines().collect();
    let mut out = srt_to_vtt(&lines).join("\n");
    out.push('\n');
    out
}

/// Decodes subtitle bytes, dropping a leading byte-order mark.
pub fn decode_subtitle(bytes: &[u8]) -> (String, SubtitleEncoding) {
    let (body, bom) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, true),
        None => (bytes, false),
    };

    match std::str::from_utf8(body) {
        Ok(text) if bom => (text.to_string(), SubtitleEncoding::Utf8Bom),
        Ok(text) => (text.to_string(), SubtitleEncoding::Utf8),
        Err(_) => (
            String::from_utf8_lossy(body).into_owned(),
            SubtitleEncoding::Lossy,
        ),
    }
}

/// Reads a subtitle file and reports the encoding it was stored in.
pub async fn read_subtitle(path: &Path) -> Result<(String, SubtitleEncoding), SubtitleError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SubtitleError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            SubtitleError::Io(e)
        }
    })?;

    let (text, encoding) = decode_subtitle(&bytes);
    if encoding == SubtitleEncoding::Lossy {
        warn!("Subtitle {:?} is not valid UTF-8, invalid bytes replaced", path);
    }
    Ok((text, encoding))
}

/// Converts `srt_path` into a UTF-8 WebVTT file at `vtt_path`.
pub async fn convert_file(srt_path: &Path, vtt_path: &Path) -> Result<SubtitleTrack, SubtitleError> {
    let (text, source_encoding) = read_subtitle(srt_path).await?;
    tokio::fs::write(vtt_path, convert_text(&text)).await?;

    debug!(
        "Converted {:?} ({:?}) to {:?}",
        srt_path, source_encoding, vtt_path
    );

    Ok(SubtitleTrack {
        path: vtt_path.to_path_buf(),
        format: SubtitleFormat::Vtt,
        encoding: SubtitleEncoding::Utf8,
    })
}
