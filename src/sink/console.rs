//! Standard output sink with optional severity colors

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::style::{Color, Stylize};

use crate::error::{LogError, Result};
use crate::record::LogRecord;
use crate::severity::Severity;

use super::LogSink;

/// Display color for a severity
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Debug => Color::Cyan,
        Severity::Info => Color::Green,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
        Severity::Critical => Color::Magenta,
    }
}

/// Writes formatted lines to the console
pub struct ConsoleSink {
    colorize: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Console sink on standard output
    pub fn stdout(colorize: bool) -> Self {
        Self::with_writer(colorize, io::stdout())
    }

    /// Console sink on an arbitrary writer (captured output, pipes)
    pub fn with_writer(colorize: bool, writer: impl Write + Send + 'static) -> Self {
        Self {
            colorize,
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    /// Write one line, colored by severity when enabled
    pub fn write_line(&self, severity: Severity, text: &str) -> Result<()> {
        let rendered = if self.colorize {
            let styled = text.with(severity_color(severity));
            if severity == Severity::Critical {
                format!("{}\n", styled.bold())
            } else {
                format!("{}\n", styled)
            }
        } else {
            format!("{}\n", text)
        };

        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        out.write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| LogError::io("Failed to write to console", e))
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&self, record: &LogRecord, line: &str) -> Result<()> {
        self.write_line(record.severity, line)
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("colorize", &self.colorize)
            .finish_non_exhaustive()
    }
}
