//! Error types for sinks and the logger facade

use std::io;

/// Errors raised by sinks, formatting, and configuration validation
///
/// None of these escape an emission call on [`crate::Logger`]; they surface from
/// construction and from direct use of the sinks.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Directory creation, file open, write, or rename failed
    #[error("{}: {}", .context, friendly_io_error_message(.source))]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Detail payload could not be represented as structured data
    #[error("detail payload not representable: {0}")]
    Format(String),

    /// Configuration rejected by validation
    #[error("invalid logger configuration: {0}")]
    Config(String),

    /// The sink was closed and accepts no further writes
    #[error("sink is closed")]
    Closed,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LogError>;

impl LogError {
    /// Wrap an IO error with a short description of the failed operation
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        LogError::Io {
            context: context.into(),
            source,
        }
    }

    /// Category of the underlying IO error, if this is an IO error
    pub fn disk_error_kind(&self) -> Option<DiskErrorKind> {
        match self {
            LogError::Io { source, .. } => Some(categorize_io_error(source)),
            _ => None,
        }
    }
}

/// Categories of disk errors for readable diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskErrorKind {
    /// Disk is full or quota exceeded
    DiskFull,
    /// Permission denied (read or write)
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// Other IO error
    Other,
}

impl DiskErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            DiskErrorKind::DiskFull => "disk full",
            DiskErrorKind::PermissionDenied => "permission denied",
            DiskErrorKind::NotFound => "file or directory not found",
            DiskErrorKind::Other => "I/O failure",
        }
    }
}

/// Categorize an IO error
pub fn categorize_io_error(e: &io::Error) -> DiskErrorKind {
    use io::ErrorKind;

    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::WriteZero => DiskErrorKind::DiskFull,
        ErrorKind::PermissionDenied => DiskErrorKind::PermissionDenied,
        ErrorKind::NotFound => DiskErrorKind::NotFound,
        _ => {
            #[cfg(unix)]
            {
                if let Some(os_error) = e.raw_os_error() {
                    // ENOSPC = 28, EDQUOT = 122 (Linux) / 69 (macOS)
                    if os_error == 28 || os_error == 122 || os_error == 69 {
                        return DiskErrorKind::DiskFull;
                    }
                    // EACCES
                    if os_error == 13 {
                        return DiskErrorKind::PermissionDenied;
                    }
                }
            }
            DiskErrorKind::Other
        }
    }
}

fn friendly_io_error_message(e: &io::Error) -> String {
    match categorize_io_error(e) {
        DiskErrorKind::Other => e.to_string(),
        kind => kind.user_message().to_string(),
    }
}
