//! Media file resolver.
//!
//! Maps a logical title to files in the download tree, which is laid out as
//! `<root>/<movies|tv>/<title>/**`. Layout inside a title directory is
//! whatever the download client produced, so matching is heuristic:
//!
//! - Movies: the largest `.mkv`/`.mp4` wins (samples and trailers are smaller)
//! - Episodes: the first `.mkv`/`.mp4` whose name contains the `sNNeNN` marker
//!
//! Nothing here is cached; the tree can change between requests.

mod fs_resolver;
mod types;

pub use fs_resolver::{find_all_media, MediaResolver};
pub use types::{MediaFile, MEDIA_EXTENSIONS, PLAYABLE_EXTENSIONS};
