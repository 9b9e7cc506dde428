pub mod config;
pub mod context;
pub mod metrics;
pub mod notify;
pub mod resolver;
pub mod subtitle;
pub mod sync;
pub mod testing;
pub mod title;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LibraryConfig,
    SanitizedConfig,
};
pub use context::AppContext;
pub use notify::{
    create_notifier, schedule_rescan, JellyfinNotifier, MediaCenterConfig, MediaCenterNotifier,
    NoopNotifier, NotifyError,
};
pub use resolver::{find_all_media, MediaFile, MediaResolver};
pub use subtitle::{
    convert_file, list_sidecar_subtitles, srt_to_vtt, PlacedSubtitle, PlacementRequest,
    SubtitleError, SubtitleFormat, SubtitlePlacer, SubtitleTrack,
};
pub use sync::{
    sync_offset, AlignmentReference, AutoSyncRequest, FfsubsyncAligner, SubtitleAligner,
    SubtitleSynchronizer, SyncConfig, SyncError, SyncHandle, SyncReport, SyncState,
};
pub use title::{normalize_title, LibrarySection, MediaContext, NormalizedTitle};
