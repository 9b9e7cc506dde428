//! Fixed-offset synchronization.

use std::path::Path;
use tracing::info;

use super::error::SyncError;
use super::types::OffsetReport;
use crate::metrics::SYNC_JOBS_TOTAL;
use crate::subtitle::{decode_subtitle, shift_cues, CUE_ARROW};

/// Shifts every cue of `unsynced_path` by `offset_secs` and writes the result
/// to `output_path`.
///
/// Cues that would start before zero are clamped to `00:00:00,000`. Does not
/// take the sync slot.
pub async fn sync_offset(
    output_path: &Path,
    unsynced_path: &Path,
    offset_secs: i64,
) -> Result<OffsetReport, SyncError> {
    let result = shift_file(output_path, unsynced_path, offset_secs).await;
    let label = match &result {
        Ok(_) => "success",
        Err(e) => e.result_label(),
    };
    SYNC_JOBS_TOTAL.with_label_values(&["offset", label]).inc();
    result
}

async fn shift_file(
    output_path: &Path,
    unsynced_path: &Path,
    offset_secs: i64,
) -> Result<OffsetReport, SyncError> {
    let bytes = tokio::fs::read(unsynced_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SyncError::InputNotFound {
                path: unsynced_path.to_path_buf(),
            }
        } else {
            SyncError::Io(e)
        }
    })?;

    let (text, _) = decode_subtitle(&bytes);
    let offset_ms = offset_secs.saturating_mul(1000);
    let shifted = shift_cues(&text, offset_ms);
    let cues_shifted = text.lines().filter(|l| l.contains(CUE_ARROW)).count();

    tokio::fs::write(output_path, shifted).await?;

    info!(
        "Shifted {} cues of {:?} by {}s into {:?}",
        cues_shifted, unsynced_path, offset_secs, output_path
    );

    Ok(OffsetReport {
        output_path: output_path.to_path_buf(),
        offset_ms,
        cues_shifted,
    })
}
