//! Error types for shardstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for shardstore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Placement Errors
    // -------------------------------------------------------------------------
    #[error("No storage nodes available")]
    NoNodesAvailable,

    #[error("Node {node} unavailable: {reason}")]
    NodeUnavailable { node: String, reason: String },

    #[error("Upload failed for shards {failed:?}")]
    PartialUploadFailure { failed: Vec<usize> },

    #[error("Shard corruption: {0}")]
    ShardCorruption(String),

    // -------------------------------------------------------------------------
    // Metadata Log Errors
    // -------------------------------------------------------------------------
    #[error("Metadata log corruption at line {line}: {reason}")]
    LogCorruption { line: usize, reason: String },

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server error: {0}")]
    Remote(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Build a `NodeUnavailable` from any displayable cause
    pub fn node_unavailable(node: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StoreError::NodeUnavailable {
            node: node.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
