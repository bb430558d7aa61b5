use crate::error::Result;
use crate::storage::KvStore;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Storage key holding the whole history document.
pub const HISTORY_KEY: &str = "typingHistory";

/// Maximum number of sessions kept; older ones are evicted.
pub const HISTORY_LIMIT: usize = 50;

/// Summary of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub timestamp: DateTime<Local>,
    pub wpm: u32,
    pub cpm: u32,
    pub accuracy: u32,
    pub elapsed_secs: u64,
    pub correct_words: usize,
    pub incorrect_words: usize,
    pub total_chars_typed: usize,
}

/// Bounded, newest-first log of past sessions on top of a key-value store.
///
/// Storage failures never escape this type: they are logged and the
/// operation degrades to a no-op (append/clear) or an empty log (list).
#[derive(Debug)]
pub struct HistoryStore<S: KvStore> {
    store: S,
}

impl<S: KvStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Prepend a result and persist the whole log. Returns false if the log
    /// could not be saved.
    pub fn append(&mut self, result: SessionResult) -> bool {
        match self.try_append(result) {
            Ok(()) => true,
            Err(e) => {
                warn!("could not save session to history: {}", e);
                false
            }
        }
    }

    fn try_append(&mut self, result: SessionResult) -> Result<()> {
        // an unreadable store must not be overwritten; a bad document can be
        let mut log = match self.load() {
            Ok(log) => log,
            Err(e) if e.is_storage() => return Err(e),
            Err(e) => {
                warn!("discarding unreadable history: {}", e);
                Vec::new()
            }
        };
        log.insert(0, result);
        log.truncate(HISTORY_LIMIT);

        let doc = serde_json::to_value(&log)?;
        self.store.set(HISTORY_KEY, &doc)
    }

    /// Snapshot of the stored log, newest first.
    pub fn list(&self) -> Vec<SessionResult> {
        match self.load() {
            Ok(log) => log,
            Err(e) => {
                warn!("could not read history: {}", e);
                Vec::new()
            }
        }
    }

    fn load(&self) -> Result<Vec<SessionResult>> {
        match self.store.get(HISTORY_KEY)? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(Vec::new()),
        }
    }

    /// Remove every entry. Asking the user first is up to the caller.
    pub fn clear(&mut self) -> bool {
        match self.store.delete(HISTORY_KEY) {
            Ok(()) => true,
            Err(e) => {
                warn!("could not clear history: {}", e);
                false
            }
        }
    }

    /// Write the current log as CSV, returning the number of rows written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let log = self.list();
        let mut writer = csv::Writer::from_path(path)?;
        for result in &log {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(log.len())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
