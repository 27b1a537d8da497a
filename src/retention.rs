//! Session directory retention
//!
//! Removes whole session directories older than a cutoff. Only directories whose
//! names parse as session stamps are considered, so unrelated content under the
//! log root is never touched.

use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};

use crate::error::{LogError, Result};
use crate::session::parse_session_stamp;

/// Delete session directories under `root` that started more than
/// `retention_days` ago, skipping `keep`
///
/// Returns the number of directories removed.
pub fn cleanup_old_sessions(
    root: &Path,
    retention_days: u64,
    keep: Option<&Path>,
) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let Some(cutoff) = i64::try_from(retention_days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|d| Utc::now().checked_sub_signed(d))
    else {
        // Retention longer than the representable time range keeps everything
        return Ok(0);
    };

    let entries = fs::read_dir(root)
        .map_err(|e| LogError::io(format!("Failed to list {}", root.display()), e))?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if keep == Some(path.as_path()) || !path.is_dir() {
            continue;
        }

        let Some(started) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_session_stamp)
        else {
            continue;
        };

        if started < cutoff {
            match fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove old session"
                ),
            }
        }
    }

    if removed > 0 {
        tracing::info!(removed, root = %root.display(), "cleaned up old log sessions");
    }
    Ok(removed)
}
