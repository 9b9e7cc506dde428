//! Types for the title module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a title refers to a movie or a single TV episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaContext {
    Movie,
    /// `episode == 0` means the title only named a season (`"Show S02"`).
    Episode { season: u32, episode: u32 },
}

impl MediaContext {
    /// Library section this context is stored under.
    pub fn section(&self) -> LibrarySection {
        match self {
            Self::Movie => LibrarySection::Movies,
            Self::Episode { .. } => LibrarySection::Tv,
        }
    }

    /// Canonical `S01E02` marker, used as the resolver pattern for episodes.
    pub fn marker(&self) -> Option<String> {
        match self {
            Self::Movie => None,
            Self::Episode { season, episode } => Some(format!("S{:02}E{:02}", season, episode)),
        }
    }

    /// True when only a season was named.
    pub fn is_full_season(&self) -> bool {
        matches!(self, Self::Episode { episode: 0, .. })
    }
}

/// Top-level directory of the download tree a title lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibrarySection {
    Movies,
    Tv,
}

impl LibrarySection {
    /// Directory name under the library root (always lower-case).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Tv => "tv",
        }
    }
}

impl fmt::Display for LibrarySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LibrarySection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(Self::Movies),
            "tv" | "shows" => Ok(Self::Tv),
            other => Err(format!("unknown library section: {}", other)),
        }
    }
}

/// Result of normalizing a display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTitle {
    /// Title with illegal characters stripped and the season token removed.
    pub title: String,
    pub context: MediaContext,
}
