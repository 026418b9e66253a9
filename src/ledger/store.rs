//! File-backed ledger store.
//!
//! The backing file is the only resource shared across listener processes,
//! so every write replaces the whole document atomically (write to a unique
//! temporary file in the same directory, then rename). Reads are defensive:
//! a missing file is an empty ledger, and corrupt content is reported as a
//! recoverable error that callers downgrade, never a crash. The store
//! self-heals on the next successful write.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::record::MessageRecord;

/// Default FIFO capacity of the ledger.
pub const DEFAULT_CAPACITY: usize = 100;

/// Ledger store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium cannot be written (permissions, disk full).
    #[error("store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    /// The backing state is unreadable or malformed. Recoverable: callers
    /// treat the ledger as empty.
    #[error("store corrupt: {0}")]
    Corrupt(String),
}

/// On-disk document shape, mirroring the wire contract of the simulator:
/// a `messages` mapping with a count and a last-updated timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerDocument {
    messages: Vec<MessageRecord>,
    total_count: usize,
    last_updated: String,
}

/// Accepted shapes on read. Writers always emit the document form, but a
/// bare array written by an older sibling is still understood.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredShape {
    Document(LedgerDocument),
    Bare(Vec<MessageRecord>),
}

/// Durable shared state visible to all listener processes.
pub struct LedgerStore {
    path: PathBuf,
    capacity: usize,
}

impl LedgerStore {
    /// Create a store backed by the given file with the given FIFO capacity.
    pub fn new<P: Into<PathBuf>>(path: P, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    /// Create a store with the default capacity.
    pub fn with_default_capacity<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(path, DEFAULT_CAPACITY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read the full current ordered sequence of records.
    ///
    /// A missing file yields an empty ledger. Unreadable or malformed
    /// content yields [`StoreError::Corrupt`].
    pub fn read_all(&self) -> Result<Vec<MessageRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let shape: StoredShape = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(match shape {
            StoredShape::Document(doc) => doc.messages,
            StoredShape::Bare(messages) => messages,
        })
    }

    /// Read the store, downgrading corruption to an empty ledger.
    pub fn read_or_empty(&self) -> Vec<MessageRecord> {
        match self.read_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "shared ledger unreadable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Add one record, enforcing the FIFO cap, persisting before returning.
    ///
    /// The read half is lenient (corrupt state starts fresh, which is how
    /// the store self-heals); only the write can fail.
    pub fn append(&self, record: MessageRecord) -> Result<(), StoreError> {
        let mut records = self.read_or_empty();
        records.push(record);
        if records.len() > self.capacity {
            let excess = records.len() - self.capacity;
            records.drain(..excess);
        }
        self.replace_all(&records)
    }

    /// Atomically overwrite the stored sequence.
    ///
    /// A concurrent reader sees either the old document or the new one,
    /// never a partial write.
    pub fn replace_all(&self, records: &[MessageRecord]) -> Result<(), StoreError> {
        let document = LedgerDocument {
            messages: records.to_vec(),
            total_count: records.len(),
            last_updated: Utc::now().to_rfc3339(),
        };

        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };

        std::fs::write(tmp.path(), &contents)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            path = %self.path.display(),
            total = records.len(),
            "shared ledger written"
        );

        Ok(())
    }
}
