//! Sessionlog - leveled, structured logging with rotating session files
//!
//! A [`Logger`] filters records by [`Severity`], renders each one through a
//! [`RecordFormatter`], and writes the line to the console, to a size-bounded file
//! under a per-session directory, and to any extra [`LogSink`]. Logging is
//! synchronous and best-effort: emission calls never return errors.
//!
//! ```no_run
//! use sessionlog::{Logger, LoggerConfig, Severity};
//!
//! let config = LoggerConfig::new("worker")
//!     .with_min_severity(Severity::Debug)
//!     .with_rotation(1024 * 1024, 3);
//! let logger = Logger::new(config)?;
//! logger.info("started", None);
//! # Ok::<(), sessionlog::LogError>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod logger;
pub mod record;
pub mod retention;
pub mod session;
pub mod severity;
pub mod sink;

pub use config::{LoggerConfig, Padding};
pub use error::{LogError, Result};
pub use format::{RecordFormatter, TextFormatter};
pub use logger::Logger;
pub use record::{detail_from, detail_from_value, Detail, LogRecord};
pub use session::SessionLayout;
pub use severity::{should_emit, Severity};
pub use sink::{ConsoleSink, LogBuffer, LogEntry, LogSink, RotatingFileSink};
