//! Subtitle files: format conversion, timing shifts and placement.
//!
//! Browsers only play WebVTT, so every SubRip file placed in the library gets
//! a `.vtt` sibling. Conversion is line based: a header is prepended and the
//! millisecond separator on timing lines changes from `,` to `.`.

mod convert;
mod error;
mod placer;
mod timing;
mod types;

pub use convert::{
    convert_file, convert_line, convert_text, decode_subtitle, read_subtitle, srt_to_vtt,
    CUE_ARROW, VTT_HEADER,
};
pub use error::SubtitleError;
pub use placer::{list_sidecar_subtitles, PlacementRequest, SubtitlePlacer};
pub use timing::{shift_cues, shift_line, Timestamp};
pub use types::{PlacedSubtitle, SubtitleEncoding, SubtitleFormat, SubtitleTrack};
