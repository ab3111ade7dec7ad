//! Append-only audit log.
//!
//! One UTC-timestamped line per notable event, for human review. Never
//! carries key material.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

/// Timestamp layout of audit lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for audit lines.
pub trait AuditSink: Send + Sync {
    /// Record one event.
    fn record(&self, message: &str);
}

/// Format one audit line, without the trailing newline.
pub fn format_line(message: &str) -> String {
    format!("[{}] {}", Utc::now().format(TIMESTAMP_FORMAT), message)
}

/// Audit log appended to a file.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, message: &str) {
        if let Err(e) = self.append(&format_line(message)) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write audit log");
        }
    }
}

/// Audit log kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format_line(message));
    }
}
