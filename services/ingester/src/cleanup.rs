//! Retention: old run directories and expired tiles.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use kairos_common::RunId;
use storage::TileStore;

use crate::sources::MODEL;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSummary {
    pub directories_removed: usize,
    pub tiles_deleted: u64,
}

/// Remove run directories initialised before the cutoff and delete tiles
/// whose forecast instant is older than it. Failures are logged only.
#[instrument(skip(tiles, data_dir))]
pub async fn cleanup(
    tiles: Option<&dyn TileStore>,
    data_dir: &Path,
    keep_hours: i64,
    now: DateTime<Utc>,
) -> CleanupSummary {
    let cutoff = now - Duration::hours(keep_hours.max(0));
    let mut summary = CleanupSummary::default();

    for parent in [data_dir.join(MODEL), data_dir.join("processed")] {
        summary.directories_removed += remove_old_runs(&parent, cutoff).await;
    }

    if let Some(tiles) = tiles {
        match tiles.delete_before(cutoff).await {
            Ok(deleted) => summary.tiles_deleted = deleted,
            Err(e) => warn!(error = %e, "Failed to delete expired tiles"),
        }
    }

    info!(
        cutoff = %cutoff,
        directories_removed = summary.directories_removed,
        tiles_deleted = summary.tiles_deleted,
        "Cleanup finished"
    );
    summary
}

async fn remove_old_runs(parent: &Path, cutoff: DateTime<Utc>) -> usize {
    let mut entries = match tokio::fs::read_dir(parent).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!(dir = %parent.display(), error = %e, "Cannot list run directories");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %parent.display(), error = %e, "Failed reading directory entry");
                break;
            }
        };

        let name = entry.file_name();
        // Anything that is not a run directory is left alone.
        let Some(run) = name.to_str().and_then(|n| RunId::from_compact(n).ok()) else {
            continue;
        };
        if run.init_time() >= cutoff {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove run"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_removes_only_expired_runs() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join(MODEL);
        for name in ["2024061000", "2024061412", "keep-me"] {
            std::fs::create_dir_all(raw.join(name)).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("processed").join("2024061000")).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let summary = cleanup(None, dir.path(), 72, now).await;

        assert_eq!(summary.directories_removed, 2);
        assert!(!raw.join("2024061000").exists());
        assert!(raw.join("2024061412").exists());
        assert!(raw.join("keep-me").exists());
    }

    #[tokio::test]
    async fn test_missing_data_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let summary = cleanup(None, &dir.path().join("nope"), 72, now).await;
        assert_eq!(summary, CleanupSummary::default());
    }
}
