//! Metadata Log Module
//!
//! Durable mapping from file name to shard placement. This is the
//! coordinator's only persistent state.
//!
//! ## Responsibilities
//! - Append a record after every successful upload
//! - Remove a record on delete by rewriting the log (write-then-swap)
//! - Answer list/lookup/verify queries from an in-memory index
//!
//! ## File Format
//! UTF-8 text, records concatenated with no separator:
//! ```text
//! a.txt;10;3                          <- header: name;totalSize;shardCount
//! /srv/node1/a.txt.part1\t10.0.0.1:6001  <- shardCount location lines,
//! /srv/node2/a.txt.part2\t10.0.0.2:6001     in shard order: path, TAB,
//! /srv/node3/a.txt.part3\t10.0.0.3:6001     address of the holding node
//! ```
//!
//! ## Index
//! The whole file is parsed once on open. Reads are answered from memory;
//! the file is only touched by append and rewrite, both serialized by a
//! single-writer lock.

mod record;
mod reader;
mod writer;
mod log;

pub use record::{FileRecord, Location};
pub use reader::LogReader;
pub use writer::LogWriter;
pub use log::MetadataLog;

/// Metadata log file name inside the data directory
pub const LOG_FILENAME: &str = "storage.txt";
