//! Sled-based storage for past quiz results.
//!
//! The whole history lives under a single key as a JSON array, read once and
//! overwritten wholesale after every completed quiz.

use crate::session::QuestionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Key under which the history list is stored
const HISTORY_KEY: &[u8] = b"quiz_history";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Outcome of one completed quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Canonical article link
    pub url: String,
    /// Article title the quiz was built from
    pub topic: String,
    pub score: usize,
    pub total: usize,
    /// When the quiz was completed
    pub timestamp: DateTime<Utc>,
    pub results: Vec<QuestionResult>,
}

impl HistoryRecord {
    fn same_entry(&self, other: &HistoryRecord) -> bool {
        self.url == other.url && self.timestamp == other.timestamp
    }

    /// Score as a whole percentage
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.score * 100 / self.total
        }
    }
}

fn upsert(records: &mut Vec<HistoryRecord>, record: HistoryRecord) {
    match records.iter_mut().find(|existing| existing.same_entry(&record)) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

/// Sled-backed quiz history.
///
/// Pass one instance to whatever drives the quiz; nothing is persisted
/// implicitly.
pub struct HistoryStore {
    db: sled::Db,
}

impl HistoryStore {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Read the full history in insertion order
    pub fn load(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        match self.db.get(HISTORY_KEY)? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrite the stored history with `records`.
    ///
    /// Records sharing a url and timestamp collapse into the last one given.
    pub fn save(&self, records: &[HistoryRecord]) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            upsert(&mut unique, record.clone());
        }
        let value = serde_json::to_vec(&unique)?;
        self.db.insert(HISTORY_KEY, value)?;
        self.db.flush()?;
        log::debug!("saved {} history records", unique.len());
        Ok(unique)
    }

    /// Add a record, replacing any existing one with the same url and timestamp
    pub fn append(&self, record: HistoryRecord) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut records = self.load()?;
        upsert(&mut records, record);
        self.save(&records)
    }

    /// Most recent records first, at most `limit`
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>, StorageError> {
        let mut records = self.load()?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        Ok(records)
    }

    /// Remove all history, returning how many records existed
    pub fn clear(&self) -> Result<usize, StorageError> {
        let count = self.load()?.len();
        self.db.remove(HISTORY_KEY)?;
        self.db.flush()?;
        Ok(count)
    }
}
