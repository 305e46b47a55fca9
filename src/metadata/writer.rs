//! Log Writer
//!
//! Handles appending records to the metadata log and rewriting it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::LogSyncStrategy;
use crate::error::Result;
use super::FileRecord;

const REWRITE_SUFFIX: &str = ".tmp";

/// Writes records to the metadata log file
///
/// Callers must serialize access (the log holds this behind a Mutex).
pub struct LogWriter {
    /// Log file path
    path: PathBuf,

    /// Append handle
    file: File,

    /// When to fsync
    sync_strategy: LogSyncStrategy,
}

impl LogWriter {
    /// Open or create the log file for appending
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let file = Self::open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_strategy,
        })
    }

    /// Append one record (header + location lines) to the end of the log
    ///
    /// A failed append truncates the file back to where the record started,
    /// so a half-written record never precedes the next one.
    pub fn append(&mut self, record: &FileRecord) -> Result<()> {
        let start = self.file.metadata()?.len();

        let result = (|| -> Result<()> {
            // One write call per record keeps its lines contiguous
            (&self.file).write_all(record.to_lines().as_bytes())?;
            (&self.file).flush()?;
            self.maybe_sync(&self.file)?;
            Ok(())
        })();

        if let Err(e) = result {
            if let Err(trunc) = self.file.set_len(start) {
                tracing::error!(
                    "Could not truncate {} to {} bytes after failed append: {}",
                    self.path.display(),
                    start,
                    trunc
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Replace the whole log with `records`
    ///
    /// The new contents go to a scratch file which is renamed over the log
    /// only once fully written, so a failure leaves the old log in place.
    pub fn rewrite(&mut self, records: &[FileRecord]) -> Result<()> {
        let tmp_path = self.rewrite_path();

        let result = (|| -> Result<File> {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            for record in records {
                tmp.write_all(record.to_lines().as_bytes())?;
            }
            tmp.flush()?;
            self.maybe_sync(&tmp)?;

            // Opened before the swap: once the rename lands nothing can fail,
            // and the handle follows the inode to its new name
            let reopened = Self::open_append(&tmp_path)?;
            fs::rename(&tmp_path, &self.path)?;
            Ok(reopened)
        })();

        match result {
            Ok(file) => {
                self.file = file;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// "storage.txt" → "storage.txt.tmp", next to the log
    fn rewrite_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(REWRITE_SUFFIX);
        PathBuf::from(name)
    }

    fn maybe_sync(&self, file: &File) -> Result<()> {
        if self.sync_strategy == LogSyncStrategy::EveryWrite {
            file.sync_data()?;
        }
        Ok(())
    }

    fn open_append(path: &Path) -> Result<File> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(file)
    }
}

#[cfg(test)]
impl LogWriter {
    /// Swap the append handle for a read-only one so every write fails
    pub(crate) fn make_read_only(&mut self) -> Result<()> {
        self.file = File::open(&self.path)?;
        Ok(())
    }
}
