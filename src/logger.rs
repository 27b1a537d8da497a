//! Logger facade
//!
//! [`Logger`] gates records by severity, formats each surviving record once, and
//! hands the line to every configured sink. Emission never fails from the
//! caller's point of view: sink errors are counted and reported through
//! `tracing`, and one failing sink does not stop the others.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::config::LoggerConfig;
use crate::error::{LogError, Result};
use crate::format::{RecordFormatter, TextFormatter};
use crate::record::{detail_from, unrepresentable, Detail, LogRecord};
use crate::retention::cleanup_old_sessions;
use crate::session::SessionLayout;
use crate::severity::{should_emit, Severity};
use crate::sink::{ConsoleSink, LogSink, RotatingFileSink};

/// Leveled logger writing to console, a rotating session file, and extra sinks
pub struct Logger {
    config: LoggerConfig,
    layout: SessionLayout,
    formatter: Box<dyn RecordFormatter>,
    console: Option<ConsoleSink>,
    file: Option<RotatingFileSink>,
    extra: Vec<Arc<dyn LogSink>>,
    failed_writes: AtomicU64,
}

impl Logger {
    /// Build a logger from `config`
    ///
    /// When the log file cannot be opened, file logging is disabled for this
    /// instance and console logging continues, unless
    /// `config.require_file_logging` is set, in which case the error is returned.
    pub fn new(config: LoggerConfig) -> Result<Self> {
        config.validate()?;

        let root = config.resolved_log_dir();
        let started_at = config.session_start.unwrap_or_else(Utc::now);
        let layout = SessionLayout::new(&root, &config.name, started_at);

        if let Some(days) = config.retention_days {
            if let Err(e) = cleanup_old_sessions(&root, days, Some(layout.dir())) {
                tracing::warn!(error = %e, "log retention sweep failed");
            }
        }

        let file = if config.file_logging {
            match RotatingFileSink::open(
                layout.dir(),
                layout.file_base_name(),
                config.file_size_limit,
                config.max_backup_files,
            ) {
                Ok(sink) => Some(sink),
                Err(e) if config.require_file_logging => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        logger = %config.name,
                        error = %e,
                        "file logging disabled, continuing with console only"
                    );
                    None
                }
            }
        } else {
            None
        };

        let console = config.console.then(|| ConsoleSink::stdout(config.colorize));
        let formatter = Box::new(TextFormatter::from_config(&config));

        tracing::debug!(
            logger = %config.name,
            session = %layout.dir().display(),
            file_logging = file.is_some(),
            "logger started"
        );

        Ok(Self {
            config,
            layout,
            formatter,
            console,
            file,
            extra: Vec::new(),
            failed_writes: AtomicU64::new(0),
        })
    }

    /// Replace the record formatter
    pub fn with_formatter(mut self, formatter: impl RecordFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Replace (or install) the console sink
    pub fn with_console(mut self, console: ConsoleSink) -> Self {
        self.console = Some(console);
        self
    }

    /// Add another destination
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.extra.push(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn min_severity(&self) -> Severity {
        self.config.min_severity
    }

    /// Whether a record at `severity` would be emitted
    pub fn is_enabled(&self, severity: Severity) -> bool {
        should_emit(severity, self.config.min_severity)
    }

    /// Directory holding this session's files
    pub fn session_dir(&self) -> &Path {
        self.layout.dir()
    }

    pub fn session(&self) -> &SessionLayout {
        &self.layout
    }

    /// Active log file, if file logging is running
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    pub fn file_sink(&self) -> Option<&RotatingFileSink> {
        self.file.as_ref()
    }

    /// Sink writes that failed since construction
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Emit one record
    pub fn log(&self, severity: Severity, message: &str, detail: Option<Detail>) {
        if !self.is_enabled(severity) {
            return;
        }
        self.emit(LogRecord::new(severity, message, detail));
    }

    /// Emit one record with any serializable detail
    ///
    /// A detail that cannot be converted is replaced by a note describing the
    /// failure; the record is still emitted.
    pub fn log_serialized<T: Serialize + ?Sized>(
        &self,
        severity: Severity,
        message: &str,
        detail: &T,
    ) {
        if !self.is_enabled(severity) {
            return;
        }
        let detail = detail_from(detail).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "degrading unrepresentable detail");
            unrepresentable(&e)
        });
        self.emit(LogRecord::new(severity, message, Some(detail)));
    }

    pub fn debug(&self, message: &str, detail: Option<Detail>) {
        self.log(Severity::Debug, message, detail);
    }

    pub fn info(&self, message: &str, detail: Option<Detail>) {
        self.log(Severity::Info, message, detail);
    }

    pub fn warning(&self, message: &str, detail: Option<Detail>) {
        self.log(Severity::Warning, message, detail);
    }

    pub fn error(&self, message: &str, detail: Option<Detail>) {
        self.log(Severity::Error, message, detail);
    }

    pub fn critical(&self, message: &str, detail: Option<Detail>) {
        self.log(Severity::Critical, message, detail);
    }

    /// Flush and close the log file; console and extra sinks keep working
    pub fn close(&self) -> Result<()> {
        match &self.file {
            Some(file) => file.close(),
            None => Ok(()),
        }
    }

    fn emit(&self, record: LogRecord) {
        let line = self.formatter.format(&record);

        if let Some(console) = &self.console {
            self.report(console.name(), console.write(&record, &line));
        }
        if let Some(file) = &self.file {
            self.report(file.name(), file.write(&record, &line));
        }
        for sink in &self.extra {
            self.report(sink.name(), sink.write(&record, &line));
        }
    }

    fn report(&self, sink: &str, result: Result<()>) {
        if let Err(e) = result {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            match e {
                LogError::Closed => tracing::trace!(sink, "dropped record for closed sink"),
                e => {
                    tracing::warn!(logger = %self.config.name, sink, error = %e, "log write failed")
                }
            }
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.config.name)
            .field("min_severity", &self.config.min_severity)
            .field("session_dir", &self.layout.dir())
            .field("console", &self.console.is_some())
            .field("file", &self.file_path())
            .field("extra_sinks", &self.extra.len())
            .finish()
    }
}
