//! Metadata Log
//!
//! Durable log plus in-memory index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::config::LogSyncStrategy;
use crate::error::{Result, StoreError};
use super::{FileRecord, Location, LogReader, LogWriter};

/// The coordinator's record store
///
/// ## Concurrency:
/// - `writer`: single-writer lock; append and rewrite are mutually exclusive
/// - `index`: RwLock, only mutated while `writer` is held, after the file
///   change has succeeded
/// - Readers never touch the file
pub struct MetadataLog {
    /// Log file path
    path: PathBuf,

    /// Append/rewrite handle (exclusive access needed)
    writer: Mutex<LogWriter>,

    /// Records in file order with a name → position map
    index: RwLock<LogIndex>,
}

/// In-memory view of the log
#[derive(Default)]
struct LogIndex {
    /// Records in file order (duplicate names possible in legacy logs)
    records: Vec<FileRecord>,

    /// Name → position of its first record
    positions: HashMap<String, usize>,
}

impl LogIndex {
    fn from_records(records: Vec<FileRecord>) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            positions.entry(record.name.clone()).or_insert(i);
        }
        Self { records, positions }
    }

    fn push(&mut self, record: FileRecord) {
        let position = self.records.len();
        self.positions.entry(record.name.clone()).or_insert(position);
        self.records.push(record);
    }

    fn get(&self, name: &str) -> Option<&FileRecord> {
        self.positions.get(name).map(|&i| &self.records[i])
    }
}

impl MetadataLog {
    /// Open or create the log at `path`
    ///
    /// Parses the whole file; a malformed file fails with `LogCorruption`
    /// instead of silently dropping records.
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let records = LogReader::read_all(path)?;
        let writer = LogWriter::open(path, sync_strategy)?;

        tracing::debug!(
            "Metadata log {} loaded: {} records",
            path.display(),
            records.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
            index: RwLock::new(LogIndex::from_records(records)),
        })
    }

    /// Append a record to the end of the log
    ///
    /// Uniqueness of `record.name` is not enforced here.
    pub fn append(&self, record: FileRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.append(&record)?;
        self.index.write().push(record);
        Ok(())
    }

    /// Remove the first record named `name` and return it
    ///
    /// All other records are kept verbatim and in order. The log is
    /// rewritten through a scratch file and swapped in; on failure both the
    /// file and the index are left as they were.
    pub fn find_and_remove(&self, name: &str) -> Result<FileRecord> {
        let mut writer = self.writer.lock();

        let (removed, remaining) = {
            let index = self.index.read();
            let position = *index
                .positions
                .get(name)
                .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

            let mut remaining = index.records.clone();
            let removed = remaining.remove(position);
            (removed, remaining)
        };

        writer.rewrite(&remaining)?;
        *self.index.write() = LogIndex::from_records(remaining);

        Ok(removed)
    }

    /// Every record's name in file order, duplicates included
    pub fn scan(&self) -> Vec<String> {
        self.index
            .read()
            .records
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Shard locations of `name`, in shard order
    pub fn find_locations(&self, name: &str) -> Result<Vec<Location>> {
        Ok(self.find(name)?.locations)
    }

    /// The first record named `name`
    pub fn find(&self, name: &str) -> Result<FileRecord> {
        self.index
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Whether a record named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.read().positions.contains_key(name)
    }

    /// Snapshot of all records in file order
    pub fn records(&self) -> Vec<FileRecord> {
        self.index.read().records.clone()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.index.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().records.is_empty()
    }

    /// Force sync to disk
    pub fn sync(&self) -> Result<()> {
        self.writer.lock().sync()
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
impl MetadataLog {
    /// Make every later append and rewrite fail
    pub(crate) fn make_read_only(&self) -> Result<()> {
        self.writer.lock().make_read_only()
    }
}
