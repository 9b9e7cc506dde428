//! Display-title cleanup and season/episode extraction.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::types::{MediaContext, NormalizedTitle};

/// Characters rejected in a path component by at least one major OS.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)s(\d+)(?:e(\d+))?").expect("season regex is valid"));

static EPISODE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)s\d{2}e\d{2}").expect("marker regex is valid"));

/// Removes characters that cannot appear in a directory name.
pub fn strip_illegal_chars(raw: &str) -> String {
    raw.chars().filter(|c| !ILLEGAL_CHARS.contains(c)).collect()
}

/// Decodes `&amp;`, `&quot;` and `&#39;`. Other entities are left alone.
pub fn unescape_html(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Drops combining marks after NFKD decomposition (`Amélie` -> `Amelie`).
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// ASCII-only search key for catalog lookups.
///
/// Non-ASCII characters that do not decompose to ASCII are dropped, as are
/// apostrophes and ampersands.
pub fn sanitize_query(query: &str) -> String {
    query
        .nfkd()
        .filter(|c| c.is_ascii() && *c != '\'' && *c != '&')
        .collect()
}

/// Returns the first strict `sNNeNN` marker in a file or release name, as written.
pub fn extract_episode_marker(name: &str) -> Option<&str> {
    EPISODE_MARKER.find(name).map(|m| m.as_str())
}

/// Cleans a display title and derives its media context.
///
/// Illegal characters are stripped before the entity decoding, matching how
/// download directories are named. The first `s<N>[e<N>]` token decides the
/// context and is cut out of the title.
pub fn normalize_title(raw: &str) -> NormalizedTitle {
    let cleaned = unescape_html(&strip_illegal_chars(raw));

    let Some(caps) = SEASON_EPISODE.captures(&cleaned) else {
        return NormalizedTitle {
            title: cleaned,
            context: MediaContext::Movie,
        };
    };

    let season = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let episode = match caps.get(2) {
        Some(m) => m.as_str().parse::<u32>().ok(),
        None => Some(0),
    };

    let (Some(season), Some(episode), Some(token)) = (season, episode, caps.get(0)) else {
        // Digit groups too large for a season number; not a real marker.
        return NormalizedTitle {
            title: cleaned,
            context: MediaContext::Movie,
        };
    };

    let mut title = String::with_capacity(cleaned.len());
    title.push_str(&cleaned[..token.start()]);
    title.push_str(&cleaned[token.end()..]);

    NormalizedTitle {
        title: title.trim().to_string(),
        context: MediaContext::Episode { season, episode },
    }
}
