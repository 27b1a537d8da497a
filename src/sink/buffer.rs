//! In-memory ring of recent records
//!
//! Keeps the last N records for display or inspection, plus a separate ring of
//! warnings and worse so alerts are not pushed out by chatty INFO traffic.

use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::record::LogRecord;
use crate::severity::Severity;

use super::LogSink;

/// A single buffered entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    /// The fully formatted line as written to the other sinks
    pub line: String,
}

/// Thread-safe ring buffer sink
#[derive(Debug)]
pub struct LogBuffer {
    entries: RwLock<VecDeque<LogEntry>>,
    alerts: RwLock<VecDeque<LogEntry>>,
    max_entries: usize,
    max_alerts: usize,
}

impl LogBuffer {
    /// Create a new log buffer with specified capacities
    pub fn new(max_entries: usize, max_alerts: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries)),
            alerts: RwLock::new(VecDeque::with_capacity(max_alerts)),
            max_entries,
            max_alerts,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        if entry.severity.is_alert() && self.max_alerts > 0 {
            let mut alerts = write(&self.alerts);
            if alerts.len() >= self.max_alerts {
                alerts.pop_front();
            }
            alerts.push_back(entry.clone());
        }

        if self.max_entries == 0 {
            return;
        }
        let mut entries = write(&self.entries);
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// All entries, oldest first
    pub fn all_entries(&self) -> Vec<LogEntry> {
        read(&self.entries).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Warnings and worse not yet acknowledged
    pub fn pending_alerts(&self) -> Vec<LogEntry> {
        read(&self.alerts).iter().cloned().collect()
    }

    pub fn alert_count(&self) -> usize {
        read(&self.alerts).len()
    }

    /// Clear all alerts (after they've been acknowledged)
    pub fn clear_alerts(&self) {
        write(&self.alerts).clear();
    }
}

impl LogSink for LogBuffer {
    fn name(&self) -> &'static str {
        "buffer"
    }

    fn write(&self, record: &LogRecord, line: &str) -> Result<()> {
        self.push(LogEntry {
            timestamp: record.timestamp,
            severity: record.severity,
            message: record.message.clone(),
            line: line.to_string(),
        });
        Ok(())
    }
}

// A writer that panicked mid-push leaves at worst one missing entry; the ring stays usable.
fn read(lock: &RwLock<VecDeque<LogEntry>>) -> RwLockReadGuard<'_, VecDeque<LogEntry>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<VecDeque<LogEntry>>) -> RwLockWriteGuard<'_, VecDeque<LogEntry>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
