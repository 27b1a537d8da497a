//! Rendering records into single emission lines

use chrono::{DateTime, Local, Utc};

use crate::config::{LoggerConfig, Padding};
use crate::record::{Detail, LogRecord};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Renders a record into the line written to every sink
///
/// Implementations must be deterministic for a given record and must not fail.
pub trait RecordFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> RecordFormatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Default column-padded text format
///
/// `<timestamp> | <SEVERITY> | <name> | <message>[ | <detail json>]`
#[derive(Debug, Clone)]
pub struct TextFormatter {
    name: String,
    padding: Padding,
    utc: bool,
}

impl TextFormatter {
    pub fn new(name: impl Into<String>, padding: Padding, utc: bool) -> Self {
        Self {
            name: name.into(),
            padding,
            utc,
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.name.clone(), config.padding, config.utc_timestamps)
    }

    fn timestamp(&self, ts: &DateTime<Utc>) -> String {
        if self.utc {
            ts.format(TIMESTAMP_FORMAT).to_string()
        } else {
            ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
        }
    }
}

impl RecordFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut line = format!(
            "{} | {:<lw$} | {:<nw$} | {}",
            self.timestamp(&record.timestamp),
            record.severity,
            self.name,
            record.message,
            lw = self.padding.level,
            nw = self.padding.name,
        );
        if let Some(detail) = record.detail.as_ref().filter(|d| !d.is_empty()) {
            line.push_str(" | ");
            line.push_str(&render_detail(detail));
        }
        line
    }
}

/// Compact JSON for a detail map, falling back to its debug form
pub fn render_detail(detail: &Detail) -> String {
    serde_json::to_string(detail).unwrap_or_else(|_| format!("{:?}", detail))
}
