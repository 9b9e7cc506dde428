//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Media resolution (lookups, skipped walk entries)
//! - Subtitle synchronization (jobs, durations, busy rejections)
//! - Subtitle placement and media-center rescans

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Resolver Metrics
// =============================================================================

/// Directory-walk entries skipped because they could not be read.
pub static WALK_ENTRIES_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mediadash_walk_entries_skipped_total",
            "Directory entries skipped during media discovery",
        ),
        &["reason"], // "permission_denied", "not_found", "other"
    )
    .unwrap()
});

/// Resolution requests by library section and outcome.
pub static RESOLUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediadash_resolutions_total", "Total media file resolutions"),
        &["section", "result"], // result: "found", "not_found"
    )
    .unwrap()
});

// =============================================================================
// Sync Metrics
// =============================================================================

/// Subtitle sync jobs by mode and result.
pub static SYNC_JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediadash_sync_jobs_total", "Total subtitle sync jobs"),
        &["mode", "result"], // mode: "auto", "offset"; result: "success", "failed", "cancelled", "unavailable"
    )
    .unwrap()
});

/// Duration of automatic alignment runs.
pub static SYNC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediadash_sync_duration_seconds",
            "Duration of automatic subtitle alignment",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Sync requests rejected because another job held the slot.
pub static SYNC_BUSY_REJECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediadash_sync_busy_rejections_total",
        "Sync requests rejected while another job was running",
    )
    .unwrap()
});

// =============================================================================
// Placement Metrics
// =============================================================================

/// Subtitle files placed next to media.
pub static SUBTITLES_PLACED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediadash_subtitles_placed_total",
        "Total subtitle files placed next to media",
    )
    .unwrap()
});

/// Media-center rescans by result.
pub static RESCANS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediadash_rescans_total", "Total media-center library rescans"),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Resolver
        Box::new(WALK_ENTRIES_SKIPPED.clone()),
        Box::new(RESOLUTIONS_TOTAL.clone()),
        // Sync
        Box::new(SYNC_JOBS_TOTAL.clone()),
        Box::new(SYNC_DURATION.clone()),
        Box::new(SYNC_BUSY_REJECTIONS.clone()),
        // Placement
        Box::new(SUBTITLES_PLACED.clone()),
        Box::new(RESCANS_TOTAL.clone()),
    ]
}
