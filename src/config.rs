//! Logger configuration
//!
//! A [`LoggerConfig`] is captured once when a [`crate::Logger`] is built and never
//! changes afterwards. Every field except `name` has a default, so a TOML file only
//! needs to carry what differs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::severity::Severity;

/// Default per-file size limit (32 MiB)
pub const DEFAULT_FILE_SIZE_LIMIT: u64 = 32 * 1024 * 1024;

/// Default number of rotated backups kept per session
pub const DEFAULT_MAX_BACKUP_FILES: usize = 2;

/// Column widths used by the text formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    /// Width of the severity column
    #[serde(default = "default_level_padding")]
    pub level: usize,
    /// Width of the logger name column
    #[serde(default = "default_name_padding")]
    pub name: usize,
}

fn default_level_padding() -> usize {
    8
}

fn default_name_padding() -> usize {
    12
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            level: default_level_padding(),
            name: default_name_padding(),
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Logger identifier, used in file names and the name column
    pub name: String,

    /// Records below this severity are dropped (default: INFO)
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,

    /// Colorize console output by severity (default: true)
    #[serde(default = "default_true")]
    pub colorize: bool,

    /// Write to standard output (default: true)
    #[serde(default = "default_true")]
    pub console: bool,

    /// Write to a rotating file under the session directory (default: true)
    #[serde(default = "default_true")]
    pub file_logging: bool,

    /// Fail construction instead of degrading to console-only when the log
    /// file cannot be opened (default: false)
    #[serde(default)]
    pub require_file_logging: bool,

    /// Root directory holding one subdirectory per session (default: ~/logs)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Per-file size limit in bytes before rotation (default: 32 MiB)
    #[serde(default = "default_file_size_limit")]
    pub file_size_limit: u64,

    /// Rotated backups kept per session; 0 truncates in place (default: 2)
    #[serde(default = "default_max_backup_files")]
    pub max_backup_files: usize,

    /// Render timestamps in UTC instead of local time (default: false)
    #[serde(default)]
    pub utc_timestamps: bool,

    /// Delete session directories older than this many days on startup
    #[serde(default)]
    pub retention_days: Option<u64>,

    /// Session start override; the construction time is used when unset
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,

    /// Column widths for the text formatter
    #[serde(default)]
    pub padding: Padding,
}

fn default_min_severity() -> Severity {
    Severity::Info
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn default_file_size_limit() -> u64 {
    DEFAULT_FILE_SIZE_LIMIT
}

fn default_max_backup_files() -> usize {
    DEFAULT_MAX_BACKUP_FILES
}

impl LoggerConfig {
    /// Create a configuration with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_severity: default_min_severity(),
            colorize: true,
            console: true,
            file_logging: true,
            require_file_logging: false,
            log_dir: default_log_dir(),
            file_size_limit: default_file_size_limit(),
            max_backup_files: default_max_backup_files(),
            utc_timestamps: false,
            retention_days: None,
            session_start: None,
            padding: Padding::default(),
        }
    }

    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_rotation(mut self, file_size_limit: u64, max_backup_files: usize) -> Self {
        self.file_size_limit = file_size_limit;
        self.max_backup_files = max_backup_files;
        self
    }

    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_file_logging(mut self, enabled: bool, required: bool) -> Self {
        self.file_logging = enabled;
        self.require_file_logging = required;
        self
    }

    pub fn with_session_start(mut self, start: DateTime<Utc>) -> Self {
        self.session_start = Some(start);
        self
    }

    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_days = Some(days);
        self
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read logger config {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("Failed to parse logger config")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize logger config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write logger config {}", path.display()))?;
        Ok(())
    }

    /// Reject configurations the logger cannot honor
    pub fn validate(&self) -> Result<(), LogError> {
        if self.name.trim().is_empty() {
            return Err(LogError::Config("logger name must not be empty".into()));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(LogError::Config(format!(
                "logger name '{}' must not contain path separators",
                self.name
            )));
        }
        if self.file_size_limit == 0 {
            return Err(LogError::Config("file_size_limit must be positive".into()));
        }
        Ok(())
    }

    /// Log root with `~` expanded
    pub fn resolved_log_dir(&self) -> PathBuf {
        let raw = self.log_dir.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&*raw).into_owned())
    }
}
