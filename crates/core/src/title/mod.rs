//! Title normalizer.
//!
//! Turns a free-text display title (`"Show S02E05"`, `"Tom &amp; Jerry"`)
//! into a lookup key for the download tree plus a [`MediaContext`].

mod normalize;
mod types;

pub use normalize::{
    extract_episode_marker, normalize_title, sanitize_query, strip_diacritics,
    strip_illegal_chars, unescape_html,
};
pub use types::{LibrarySection, MediaContext, NormalizedTitle};
