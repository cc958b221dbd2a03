//! The activity ledger: a capped, newest-first log of mutations.
//!
//! Entries are pushed at the front and overflow is trimmed from the back, so
//! eviction is FIFO by insertion order. Since every append is synchronous and
//! timestamped at append time, insertion order coincides with chronological
//! order for locally produced entries.

use crate::types::{AppLog, EntityId, LogType, Timestamp};
use std::collections::VecDeque;

/// Maximum entries retained before the oldest are evicted.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Capped newest-first ledger of [`AppLog`] entries.
#[derive(Debug)]
pub struct LogRecorder {
    entries: VecDeque<AppLog>,
    capacity: usize,
}

impl LogRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append an entry at the head, evicting from the tail on overflow.
    ///
    /// Always succeeds; the entry gets a fresh id and timestamp.
    pub fn add(
        &mut self,
        log_type: LogType,
        description: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> AppLog {
        let entry = AppLog {
            id: EntityId::generate(),
            log_type,
            description: description.into(),
            timestamp: Timestamp::now(),
            details,
        };
        self.entries.push_front(entry.clone());
        self.entries.truncate(self.capacity);
        entry
    }

    /// All entries, or only those of one type, in stored order (newest
    /// first).
    pub fn logs(&self, filter: Option<LogType>) -> Vec<AppLog> {
        match filter {
            Some(log_type) => self
                .entries
                .iter()
                .filter(|e| e.log_type == log_type)
                .cloned()
                .collect(),
            None => self.entries.iter().cloned().collect(),
        }
    }

    /// Empty the local ledger. Any external mirror is untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the ledger wholesale from a mirror snapshot.
    ///
    /// The snapshot is sorted newest-first by timestamp and capped. An empty
    /// snapshot is ignored so a cold mirror never wipes local history.
    pub fn replace_from_snapshot(&mut self, mut entries: Vec<AppLog>) {
        if entries.is_empty() {
            return;
        }
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(self.capacity);
        self.entries = entries.into();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_order() {
        let mut recorder = LogRecorder::default();
        recorder.add(LogType::AdminLogin, "first", None);
        recorder.add(LogType::AdminLogout, "second", None);

        let logs = recorder.logs(None);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].description, "second");
        assert_eq!(logs[1].description, "first");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut recorder = LogRecorder::new(1000);
        for i in 0..1001 {
            recorder.add(LogType::Payment, format!("entry {i}"), None);
        }
        let logs = recorder.logs(None);
        assert_eq!(logs.len(), 1000);
        assert_eq!(logs[0].description, "entry 1000");
        assert!(logs.iter().all(|l| l.description != "entry 0"));
    }

    #[test]
    fn test_type_filter() {
        let mut recorder = LogRecorder::default();
        recorder.add(LogType::Payment, "pay", None);
        recorder.add(LogType::Delivery, "deliver", None);
        recorder.add(LogType::Payment, "pay again", None);

        let payments = recorder.logs(Some(LogType::Payment));
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|l| l.log_type == LogType::Payment));
    }

    #[test]
    fn test_clear_is_local_only() {
        let mut recorder = LogRecorder::default();
        recorder.add(LogType::Payment, "pay", None);
        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_snapshot_replaces_sorted_and_capped() {
        let mut recorder = LogRecorder::new(3);
        recorder.add(LogType::Payment, "local", None);

        let snapshot: Vec<AppLog> = (0..5)
            .map(|i| AppLog {
                id: EntityId::generate(),
                log_type: LogType::Delivery,
                description: format!("remote {i}"),
                timestamp: Timestamp(i),
                details: None,
            })
            .collect();
        recorder.replace_from_snapshot(snapshot);

        let logs = recorder.logs(None);
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].description, "remote 4");
        assert_eq!(logs[2].description, "remote 2");
    }

    #[test]
    fn test_empty_snapshot_ignored() {
        let mut recorder = LogRecorder::default();
        recorder.add(LogType::Payment, "local", None);
        recorder.replace_from_snapshot(Vec::new());
        assert_eq!(recorder.len(), 1);
    }
}
