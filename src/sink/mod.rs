//! Log destinations
//!
//! Every destination implements [`LogSink`]. The logger formats a record once and
//! hands the same line to each sink; a failing sink never stops the others.

mod buffer;
mod console;
mod file;

pub use buffer::{LogBuffer, LogEntry};
pub use console::{severity_color, ConsoleSink};
pub use file::RotatingFileSink;

use crate::error::Result;
use crate::record::LogRecord;

pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Record one formatted line
    fn write(&self, record: &LogRecord, line: &str) -> Result<()>;
}
