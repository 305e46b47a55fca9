//! Record definitions
//!
//! A record maps one file name to the ordered locations of its shards.

use crate::error::{Result, StoreError};

/// Where one shard lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Shard path on the node ("{storagePath}/{name}.part{i}")
    pub path: String,

    /// "host:port" of the node holding the shard
    pub node: String,
}

impl Location {
    pub fn new(path: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            node: node.into(),
        }
    }

    /// Encode as a single log line (without newline)
    pub fn to_line(&self) -> String {
        format!("{}\t{}", self.path, self.node)
    }
}

/// Placement record of one uploaded file
///
/// `locations[i]` is shard `i`, stored on the node that held registry
/// position `i` at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Logical key
    pub name: String,

    /// Size of the original payload in bytes
    pub total_size: u64,

    /// Shard locations in shard order
    pub locations: Vec<Location>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, total_size: u64, locations: Vec<Location>) -> Self {
        Self {
            name: name.into(),
            total_size,
            locations,
        }
    }

    /// Number of shards (== nodes registered at upload time)
    pub fn shard_count(&self) -> usize {
        self.locations.len()
    }

    /// Shard paths in shard order
    pub fn paths(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.path.clone()).collect()
    }

    /// Header line: `name;totalSize;shardCount`
    pub fn header_line(&self) -> String {
        format!("{};{};{}", self.name, self.total_size, self.shard_count())
    }

    /// Encode the header and all location lines, newline-terminated
    pub fn to_lines(&self) -> String {
        let mut out = self.header_line();
        out.push('\n');
        for location in &self.locations {
            out.push_str(&location.to_line());
            out.push('\n');
        }
        out
    }

    /// Reject names the log format or the shard naming cannot carry
    ///
    /// `;` splits header fields, line breaks and tabs split lines, and path
    /// separators would let a shard escape the node's storage directory.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(StoreError::InvalidName("empty name".to_string()));
        }
        if name == "." || name == ".." {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if name
            .chars()
            .any(|c| c == ';' || c == '/' || c == '\\' || c.is_control())
        {
            return Err(StoreError::InvalidName(format!(
                "{:?} contains a reserved character",
                name
            )));
        }
        Ok(())
    }
}
