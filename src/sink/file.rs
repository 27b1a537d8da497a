//! Size-bounded log file with generation-shifted backups
//!
//! The sink owns one active file per session. When the active file reaches the
//! configured size it is sealed as backup generation 1, older generations shift
//! up by one, the oldest beyond `max_backups` is discarded, and a fresh file is
//! started at the original path.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{LogError, Result};
use crate::record::LogRecord;
use crate::session::{active_file_path, backup_file_path};

use super::LogSink;

/// Mutable state guarded by the sink lock
#[derive(Debug)]
struct FileState {
    /// None after `close()` or when a rotation lost the handle
    file: Option<File>,
    /// Bytes written to the active file
    written: u64,
    /// Set only by `close()`
    closed: bool,
    /// Failed rotation attempts since the sink was opened
    rotation_failures: u64,
    /// True while rotations keep failing, so the failure is warned about once
    rotation_failing: bool,
}

/// Rotating file sink
#[derive(Debug)]
pub struct RotatingFileSink {
    dir: PathBuf,
    base: String,
    path: PathBuf,
    size_limit: u64,
    max_backups: usize,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    /// Create `dir` (and parents) and open `<dir>/<base>.log` for appending
    pub fn open(dir: &Path, base: &str, size_limit: u64, max_backups: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| LogError::io(format!("Failed to create {}", dir.display()), e))?;

        let path = active_file_path(dir, base);
        let file = open_append(&path)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        tracing::debug!(path = %path.display(), size_limit, max_backups, "opened log file");

        Ok(Self {
            dir: dir.to_path_buf(),
            base: base.to_string(),
            path,
            size_limit: size_limit.max(1),
            max_backups,
            state: Mutex::new(FileState {
                file: Some(file),
                written,
                closed: false,
                rotation_failures: 0,
                rotation_failing: false,
            }),
        })
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of backup `generation` (1 = most recent)
    pub fn backup_path(&self, generation: usize) -> PathBuf {
        backup_file_path(&self.dir, &self.base, generation)
    }

    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Bytes written to the active file since it was started
    pub fn bytes_written(&self) -> u64 {
        self.lock().written
    }

    /// True once `close()` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Failed rotation attempts; lines keep going to the active file meanwhile
    pub fn rotation_failures(&self) -> u64 {
        self.lock().rotation_failures
    }

    /// Append `line` plus a newline, rotating around the write as needed
    ///
    /// A line is never split across files: if it would overflow a non-empty file
    /// the file is rotated first, and a file that reaches the limit is rotated
    /// right after the write. A failed rotation does not fail the write; the line
    /// goes to the active file and the rotation is retried on the next write.
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        let incoming = buf.len() as u64;

        let mut state = self.lock();
        if state.closed {
            return Err(LogError::Closed);
        }
        if state.file.is_none() {
            self.reopen(&mut state)?;
        }

        if state.written > 0 && state.written + incoming > self.size_limit {
            self.try_rotate(&mut state);
        }

        let Some(file) = state.file.as_mut() else {
            return Err(LogError::io(
                format!("Lost handle to {}", self.path.display()),
                io::Error::from(io::ErrorKind::NotFound),
            ));
        };
        file.write_all(&buf)
            .map_err(|e| LogError::io(format!("Failed to write {}", self.path.display()), e))?;
        state.written += incoming;

        if state.written >= self.size_limit {
            self.try_rotate(&mut state);
        }
        Ok(())
    }

    /// Force a rotation regardless of size
    pub fn rotate_now(&self) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(LogError::Closed);
        }
        self.rotate(&mut state)
    }

    /// Flush and release the file; later writes fail with [`LogError::Closed`]
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock();
        state.closed = true;
        match state.file.take() {
            Some(mut file) => file
                .flush()
                .map_err(|e| LogError::io(format!("Failed to flush {}", self.path.display()), e)),
            None => Ok(()),
        }
    }

    /// Rotate as part of a write, reporting a failure instead of returning it
    fn try_rotate(&self, state: &mut FileState) {
        match self.rotate(state) {
            Ok(()) => {
                if state.rotation_failing {
                    tracing::info!(path = %self.path.display(), "log rotation recovered");
                }
                state.rotation_failing = false;
            }
            Err(e) => {
                state.rotation_failures += 1;
                if !state.rotation_failing {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "log rotation failed, appending to the active file"
                    );
                }
                state.rotation_failing = true;
            }
        }
    }

    fn reopen(&self, state: &mut FileState) -> Result<()> {
        let file = open_append(&self.path)?;
        state.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        state.file = Some(file);
        Ok(())
    }

    /// Runs with the lock held, so no write can land mid-rotation
    fn rotate(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut file) = state.file.take() {
            // A failed flush still leaves the bytes with the OS; keep rotating.
            let _ = file.flush();
        }

        let result = if self.max_backups == 0 {
            File::create(&self.path).map_err(|e| {
                LogError::io(format!("Failed to truncate {}", self.path.display()), e)
            })
        } else {
            self.shift_backups().and_then(|_| open_append(&self.path))
        };

        match result {
            Ok(file) => {
                state.file = Some(file);
                state.written = 0;
                tracing::debug!(path = %self.path.display(), "rotated log file");
                Ok(())
            }
            Err(e) => {
                // Keep the sink usable: fall back to appending at the original path.
                // If that fails too, the next write retries the open.
                let _ = self.reopen(state);
                Err(e)
            }
        }
    }

    /// Move generation k to k+1 (oldest first discarded), then active to 1
    fn shift_backups(&self) -> Result<()> {
        let oldest = self.backup_path(self.max_backups);
        remove_if_exists(&oldest)?;

        for generation in (1..self.max_backups).rev() {
            let from = self.backup_path(generation);
            if from.exists() {
                rename(&from, &self.backup_path(generation + 1))?;
            }
        }

        rename(&self.path, &self.backup_path(1))
    }

    fn lock(&self) -> MutexGuard<'_, FileState> {
        // The state is a handle and a counter; both stay valid after a panic elsewhere.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for RotatingFileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&self, _record: &LogRecord, line: &str) -> Result<()> {
        self.write_line(line)
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogError::io(format!("Failed to open {}", path.display()), e))
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    // Windows refuses to rename over an existing file
    remove_if_exists(to)?;
    fs::rename(from, to).map_err(|e| {
        LogError::io(
            format!("Failed to rename {} to {}", from.display(), to.display()),
            e,
        )
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LogError::io(format!("Failed to remove {}", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    /// 39 visible bytes, 40 with the newline
    fn line(n: usize) -> String {
        format!("{:<39}", format!("line {}", n))
    }

    #[test]
    fn test_open_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b").join("c");
        let sink = RotatingFileSink::open(&dir, "app", 1024, 2).unwrap();
        assert!(sink.path().exists());
        assert_eq!(sink.path(), dir.join("app.log"));
        assert_eq!(sink.bytes_written(), 0);
    }

    #[test]
    fn test_open_fails_when_directory_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a dir").unwrap();

        let err = RotatingFileSink::open(&blocker.join("session"), "app", 1024, 2).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
    }

    #[test]
    fn test_write_counts_bytes_with_newline() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 1024, 2).unwrap();
        sink.write_line("hello").unwrap();
        assert_eq!(sink.bytes_written(), 6);
        assert_eq!(read(sink.path()), "hello\n");
    }

    #[test]
    fn test_rotates_before_overflowing_line() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 2).unwrap();

        sink.write_line(&line(1)).unwrap();
        sink.write_line(&line(2)).unwrap();
        assert_eq!(sink.bytes_written(), 80);
        assert!(!sink.backup_path(1).exists());

        sink.write_line(&line(3)).unwrap();
        assert_eq!(read(sink.path()), format!("{}\n", line(3)));
        assert_eq!(read(&sink.backup_path(1)), format!("{}\n{}\n", line(1), line(2)));
        assert_eq!(sink.bytes_written(), 40);
    }

    #[test]
    fn test_exact_limit_rotates_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 80, 2).unwrap();

        sink.write_line(&line(1)).unwrap();
        sink.write_line(&line(2)).unwrap();

        assert_eq!(sink.bytes_written(), 0);
        assert_eq!(read(sink.path()), "");
        assert_eq!(read(&sink.backup_path(1)), format!("{}\n{}\n", line(1), line(2)));
    }

    #[test]
    fn test_oversized_line_is_kept_whole() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 10, 1).unwrap();
        let long = "x".repeat(25);

        sink.write_line(&long).unwrap();
        assert_eq!(read(&sink.backup_path(1)), format!("{}\n", long));
        assert_eq!(read(sink.path()), "");
    }

    #[test]
    fn test_backup_bound_discards_oldest() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 40, 2).unwrap();

        for n in 1..=6 {
            sink.write_line(&line(n)).unwrap();
        }

        // each line fills a file exactly, so every write seals a generation
        assert_eq!(read(&sink.backup_path(1)), format!("{}\n", line(6)));
        assert_eq!(read(&sink.backup_path(2)), format!("{}\n", line(5)));
        assert!(!sink.backup_path(3).exists());

        let files = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(files, 3);
    }

    #[test]
    fn test_zero_backups_truncates_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 0).unwrap();

        for n in 1..=3 {
            sink.write_line(&line(n)).unwrap();
        }

        assert_eq!(read(sink.path()), format!("{}\n", line(3)));
        assert!(!sink.backup_path(1).exists());
        assert!(!sink.backup_path(2).exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rotation_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 3).unwrap();

        let lines: Vec<String> = (1..=7).map(line).collect();
        for l in &lines {
            sink.write_line(l).unwrap();
        }

        let mut seen = String::new();
        for generation in (1..=3).rev() {
            seen.push_str(&read(&sink.backup_path(generation)));
        }
        seen.push_str(&read(sink.path()));

        let seen: Vec<&str> = seen.lines().collect();
        assert_eq!(seen, lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_reopen_counts_existing_bytes() {
        let temp_dir = TempDir::new().unwrap();
        {
            let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 2).unwrap();
            sink.write_line(&line(1)).unwrap();
        }
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 2).unwrap();
        assert_eq!(sink.bytes_written(), 40);
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 2).unwrap();
        sink.write_line("before").unwrap();
        sink.close().unwrap();

        assert!(sink.is_closed());
        assert!(matches!(sink.write_line("after"), Err(LogError::Closed)));
        assert!(matches!(sink.rotate_now(), Err(LogError::Closed)));
        assert!(sink.close().is_ok());
        assert_eq!(read(sink.path()), "before\n");
    }

    #[test]
    fn test_rotate_now() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 1000, 2).unwrap();
        sink.write_line("first").unwrap();
        sink.rotate_now().unwrap();
        sink.write_line("second").unwrap();

        assert_eq!(read(&sink.backup_path(1)), "first\n");
        assert_eq!(read(sink.path()), "second\n");
    }

    #[test]
    fn test_failed_rotation_keeps_lines_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 100, 2).unwrap();
        // a directory at the oldest generation makes every shift fail
        fs::create_dir(sink.backup_path(2)).unwrap();

        let lines: Vec<String> = (1..=7).map(line).collect();
        for l in &lines {
            sink.write_line(l).unwrap();
        }

        let active: Vec<String> = read(sink.path()).lines().map(String::from).collect();
        assert_eq!(active, lines);
        assert!(sink.rotation_failures() >= 1);
        assert!(!sink.is_closed());

        fs::remove_dir(sink.backup_path(2)).unwrap();
        sink.write_line(&line(8)).unwrap();

        let sealed: Vec<String> = read(&sink.backup_path(1)).lines().map(String::from).collect();
        assert_eq!(sealed, lines);
        assert_eq!(read(sink.path()), format!("{}\n", line(8)));
    }

    #[test]
    fn test_failed_rotation_after_write_is_not_a_write_error() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 80, 2).unwrap();
        fs::create_dir(sink.backup_path(2)).unwrap();

        assert!(sink.write_line(&line(1)).is_ok());
        assert!(sink.write_line(&line(2)).is_ok());

        assert_eq!(sink.rotation_failures(), 1);
        assert_eq!(read(sink.path()), format!("{}\n{}\n", line(1), line(2)));
        assert_eq!(sink.bytes_written(), 80);
    }

    #[test]
    fn test_lost_handle_is_reopened() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 1000, 2).unwrap();
        sink.write_line("first").unwrap();
        sink.lock().file = None;

        assert!(!sink.is_closed());
        sink.write_line("second").unwrap();
        assert_eq!(read(sink.path()), "first\nsecond\n");
        assert_eq!(sink.bytes_written(), 13);
    }

    #[test]
    fn test_lost_handle_reports_io_error_not_closed() {
        let temp_dir = TempDir::new().unwrap();
        let sink = RotatingFileSink::open(temp_dir.path(), "app", 1000, 2).unwrap();
        sink.lock().file = None;
        fs::remove_file(sink.path()).unwrap();
        fs::create_dir(sink.path()).unwrap();

        let err = sink.write_line("lost").unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
        assert!(!sink.is_closed());
    }

    #[test]
    fn test_concurrent_writers_never_split_lines() {
        let temp_dir = TempDir::new().unwrap();
        let sink = Arc::new(RotatingFileSink::open(temp_dir.path(), "app", 4096, 50).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        sink.write_line(&format!("thread-{:02} message-{:03}", t, i))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut all = Vec::new();
        for generation in 1..=50 {
            all.extend(read(&sink.backup_path(generation)).lines().map(String::from));
        }
        all.extend(read(sink.path()).lines().map(String::from));

        assert_eq!(all.len(), 400);
        for l in &all {
            assert!(l.starts_with("thread-") && l.len() == "thread-00 message-000".len());
        }
        for t in 0..8 {
            for i in 0..50 {
                let expected = format!("thread-{:02} message-{:03}", t, i);
                assert!(all.contains(&expected), "missing {}", expected);
            }
        }
    }
}
