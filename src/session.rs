//! Session directory and file naming
//!
//! Every logger instance writes under `<root>/<stamp>/<name>-<stamp>.log`, where
//! `<stamp>` is the ISO-8601 session start with colons replaced by hyphens so the
//! name is valid on every filesystem. Backups live next to the active file as
//! `<name>-<stamp>.log.<generation>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format of a session stamp after colon replacement
const STAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.fZ";

/// Resolved on-disk layout of one logger session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLayout {
    started_at: DateTime<Utc>,
    stamp: String,
    dir: PathBuf,
    file_base_name: String,
}

impl SessionLayout {
    pub fn new(root: &Path, logger_name: &str, started_at: DateTime<Utc>) -> Self {
        let stamp = session_stamp(&started_at);
        Self {
            started_at,
            dir: root.join(&stamp),
            file_base_name: format!("{}-{}", logger_name, stamp),
            stamp,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Directory name component, e.g. `2026-01-21T14-30-45.123Z`
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name without the `.log` extension
    pub fn file_base_name(&self) -> &str {
        &self.file_base_name
    }

    /// Full path of the active log file
    pub fn file_path(&self) -> PathBuf {
        active_file_path(&self.dir, &self.file_base_name)
    }
}

/// ISO-8601 timestamp with colons replaced by hyphens
pub fn session_stamp(started_at: &DateTime<Utc>) -> String {
    started_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-")
}

/// Parse a session directory name back into its start time
pub fn parse_session_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, STAMP_PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn active_file_path(dir: &Path, base: &str) -> PathBuf {
    dir.join(format!("{}.log", base))
}

pub(crate) fn backup_file_path(dir: &Path, base: &str, generation: usize) -> PathBuf {
    dir.join(format!("{}.log.{}", base, generation))
}
