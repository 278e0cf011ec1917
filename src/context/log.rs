//! Per-run export log
//!
//! Entries are kept for the operator (the host shows them after the run)
//! and mirrored to `tracing` as they are written.

use std::fmt;

use tracing::{Level, debug, error, info, warn};

/// One log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    /// Identifier of the record the entry refers to, if any
    pub record_id: Option<i64>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record_id {
            Some(id) => write!(f, "[{}] record {}: {}", self.level, id, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

/// Ordered log sink for one export run
#[derive(Debug, Clone, Default)]
pub struct ExportLog {
    entries: Vec<LogEntry>,
}

impl ExportLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and mirror it to tracing
    pub fn write(&mut self, level: Level, message: impl Into<String>, record_id: Option<i64>) {
        let entry = LogEntry {
            level,
            message: message.into(),
            record_id,
        };

        match entry.level {
            Level::ERROR => error!("{}", entry),
            Level::WARN => warn!("{}", entry),
            Level::INFO => info!("{}", entry),
            _ => debug!("{}", entry),
        }

        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.write(Level::INFO, message, None);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.write(Level::WARN, message, None);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.write(Level::ERROR, message, None);
    }

    /// Log a failure correlated to a record
    pub fn record_error(&mut self, record_id: i64, message: impl Into<String>) {
        self.write(Level::ERROR, message, Some(record_id));
    }

    /// All entries in write order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at the given level
    pub fn entries_at(&self, level: Level) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order() {
        let mut log = ExportLog::new();
        log.info("started");
        log.record_error(7, "Price not loaded");
        log.warn("slow segment");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].record_id, Some(7));
        assert_eq!(entries[1].level, Level::ERROR);
        assert_eq!(log.entries_at(Level::ERROR).count(), 1);
    }

    #[test]
    fn test_entry_display() {
        let mut log = ExportLog::new();
        log.record_error(3, "boom");
        assert_eq!(log.entries()[0].to_string(), "[ERROR] record 3: boom");
    }
}
