//! Shared application context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::notify::{create_notifier, MediaCenterNotifier, NotifyError};
use crate::resolver::{MediaFile, MediaResolver};
use crate::subtitle::SubtitlePlacer;
use crate::sync::{
    AutoSyncRequest, FfsubsyncAligner, SubtitleAligner, SubtitleSynchronizer, SyncError,
    SyncHandle,
};
use crate::title::normalize_title;

/// Everything a request handler needs, built once at startup.
///
/// Cloning is cheap; all components are shared.
pub struct AppContext<A: SubtitleAligner = FfsubsyncAligner> {
    config: Arc<Config>,
    resolver: MediaResolver,
    synchronizer: Arc<SubtitleSynchronizer<A>>,
    placer: Arc<SubtitlePlacer>,
    notifier: Arc<dyn MediaCenterNotifier>,
}

impl<A: SubtitleAligner> Clone for AppContext<A> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            resolver: self.resolver.clone(),
            synchronizer: Arc::clone(&self.synchronizer),
            placer: Arc::clone(&self.placer),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl AppContext<FfsubsyncAligner> {
    /// Builds the context with the ffsubsync aligner.
    pub fn from_config(config: Config) -> Result<Self, NotifyError> {
        let aligner = FfsubsyncAligner::new(config.sync.clone());
        Self::with_aligner(config, aligner)
    }
}

impl<A: SubtitleAligner + 'static> AppContext<A> {
    /// Builds the context around a custom aligner.
    pub fn with_aligner(config: Config, aligner: A) -> Result<Self, NotifyError> {
        let notifier = create_notifier(config.media_center.as_ref())?;
        let rescan_delay = config
            .media_center
            .as_ref()
            .map(|m| Duration::from_secs(m.rescan_delay_secs))
            .unwrap_or_default();

        let resolver = MediaResolver::new(&config.library.root);
        let placer = SubtitlePlacer::new(
            resolver.clone(),
            &config.library.work_dir,
            &config.library.subtitle_language,
            Arc::clone(&notifier),
        )
        .with_rescan_delay(rescan_delay);
        let synchronizer = SubtitleSynchronizer::new(config.sync.clone(), aligner);

        Ok(Self {
            config: Arc::new(config),
            resolver,
            synchronizer: Arc::new(synchronizer),
            placer: Arc::new(placer),
            notifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    pub fn synchronizer(&self) -> &Arc<SubtitleSynchronizer<A>> {
        &self.synchronizer
    }

    pub fn placer(&self) -> &Arc<SubtitlePlacer> {
        &self.placer
    }

    pub fn notifier(&self) -> &Arc<dyn MediaCenterNotifier> {
        &self.notifier
    }

    /// Resolves a display title such as `Show S02E05` to its media file.
    ///
    /// Walks the filesystem; call from a blocking context.
    pub fn resolve_title(&self, raw_title: &str) -> Option<MediaFile> {
        let normalized = normalize_title(raw_title);
        let pattern = if normalized.context.is_full_season() {
            None
        } else {
            normalized.context.marker()
        };
        debug!(
            "Resolving {:?} as {:?} in {}",
            normalized.title,
            normalized.context,
            normalized.context.section()
        );
        self.resolver.resolve(
            normalized.context.section(),
            &normalized.title,
            pattern.as_deref(),
        )
    }

    /// Resolves `raw_title` and starts an automatic sync against its media.
    pub async fn start_title_sync(
        &self,
        raw_title: &str,
        unsynced_path: &Path,
        output_path: &Path,
    ) -> Result<SyncHandle, SyncError> {
        let context = self.clone();
        let title = raw_title.to_string();
        let media = tokio::task::spawn_blocking(move || context.resolve_title(&title))
            .await
            .map_err(|e| SyncError::Internal {
                reason: e.to_string(),
            })?
            .ok_or_else(|| SyncError::MediaNotFound {
                title: raw_title.to_string(),
            })?;

        self.synchronizer.spawn_auto(AutoSyncRequest::new(
            PathBuf::from(output_path),
            PathBuf::from(unsynced_path),
            media.path,
        ))
    }
}
