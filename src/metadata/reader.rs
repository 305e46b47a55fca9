//! Log Reader
//!
//! Parses the metadata log into records.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, StoreError};
use super::{FileRecord, Location};

/// Parses metadata log contents
pub struct LogReader;

impl LogReader {
    /// Read every record from the log at `path`
    ///
    /// A missing file is an empty log.
    pub fn read_all(path: &Path) -> Result<Vec<FileRecord>> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse log text into records, in file order
    ///
    /// Blank lines between records are skipped. Anything else that is not a
    /// well-formed header followed by exactly `shardCount` location lines is
    /// reported as `LogCorruption` with its 1-based line number.
    pub fn parse(contents: &str) -> Result<Vec<FileRecord>> {
        let mut records = Vec::new();
        let mut lines = contents.lines().enumerate().map(|(i, l)| (i + 1, l));

        while let Some((line_no, line)) = lines.next() {
            if line.trim().is_empty() {
                continue;
            }

            let (name, total_size, shard_count) = Self::parse_header(line_no, line)?;

            let mut locations = Vec::with_capacity(shard_count);
            for shard in 0..shard_count {
                let (loc_line_no, loc_line) = lines.next().ok_or_else(|| corruption(
                    line_no,
                    format!(
                        "record {:?} declares {} shards but the log ends after {}",
                        name, shard_count, shard
                    ),
                ))?;
                locations.push(Self::parse_location(loc_line_no, loc_line)?);
            }

            records.push(FileRecord::new(name, total_size, locations));
        }

        Ok(records)
    }

    /// "a.txt;10;3" → ("a.txt", 10, 3)
    fn parse_header(line_no: usize, line: &str) -> Result<(String, u64, usize)> {
        let parts: Vec<&str> = line.split(';').collect();
        if parts.len() != 3 {
            return Err(corruption(
                line_no,
                format!("expected header name;totalSize;shardCount, got {:?}", line),
            ));
        }

        let name = parts[0];
        if name.is_empty() {
            return Err(corruption(line_no, "empty file name".to_string()));
        }

        let total_size = parts[1]
            .parse::<u64>()
            .map_err(|_| corruption(line_no, format!("invalid total size {:?}", parts[1])))?;
        let shard_count = parts[2]
            .parse::<usize>()
            .map_err(|_| corruption(line_no, format!("invalid shard count {:?}", parts[2])))?;

        Ok((name.to_string(), total_size, shard_count))
    }

    /// "/srv/node1/a.txt.part1\t10.0.0.1:6001" → Location
    fn parse_location(line_no: usize, line: &str) -> Result<Location> {
        let (path, node) = line.split_once('\t').ok_or_else(|| {
            corruption(line_no, format!("location line without node address: {:?}", line))
        })?;

        if path.is_empty() || node.is_empty() || path.contains(';') {
            return Err(corruption(line_no, format!("malformed location line: {:?}", line)));
        }

        Ok(Location::new(path, node))
    }
}

fn corruption(line: usize, reason: String) -> StoreError {
    StoreError::LogCorruption { line, reason }
}
