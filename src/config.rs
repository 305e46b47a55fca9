//! Configuration for shardstore
//!
//! Coordinator settings with defaults matching a single-host deployment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Metadata
    // -------------------------------------------------------------------------
    /// Directory holding the coordinator's persistent state
    ///   {data_dir}/
    ///     ├── storage.txt      (metadata log)
    ///     └── storage.txt.tmp  (rewrite scratch file, only during delete)
    pub data_dir: PathBuf,

    /// When the metadata log is fsynced
    pub log_sync_strategy: LogSyncStrategy,

    // -------------------------------------------------------------------------
    // Dispatcher
    // -------------------------------------------------------------------------
    /// Address the coordinator accepts clients and nodes on
    pub listen_addr: String,

    /// Connections served at once; extra ones get an ERROR response
    pub max_connections: usize,

    /// Bound on reading a request from a peer and writing its response
    pub client_timeout: Duration,

    // -------------------------------------------------------------------------
    // Storage Nodes
    // -------------------------------------------------------------------------
    /// Bound on connect, read and write for every STORE / RETRIEVE / REMOVE
    pub node_timeout: Duration,
}

/// Metadata log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogSyncStrategy {
    /// fsync after every append and rewrite
    #[default]
    EveryWrite,

    /// Leave flushing to the OS page cache
    OsBuffered,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./shardstore_data"),
            log_sync_strategy: LogSyncStrategy::default(),
            listen_addr: "127.0.0.1:5000".to_string(),
            max_connections: 1024,
            client_timeout: Duration::from_secs(30),
            node_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the metadata log inside `data_dir`
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(crate::metadata::LOG_FILENAME)
    }

    fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(StoreError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(StoreError::Config("max_connections must be at least 1".to_string()));
        }
        // A zero Duration is rejected by the socket timeout setters
        if self.client_timeout.is_zero() || self.node_timeout.is_zero() {
            return Err(StoreError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Default)]
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.data_dir = dir.into();
        self
    }

    pub fn log_sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.inner.log_sync_strategy = strategy;
        self
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.inner.listen_addr = addr.into();
        self
    }

    pub fn max_connections(mut self, limit: usize) -> Self {
        self.inner.max_connections = limit;
        self
    }

    pub fn client_timeout(mut self, timeout: Duration) -> Self {
        self.inner.client_timeout = timeout;
        self
    }

    pub fn node_timeout(mut self, timeout: Duration) -> Self {
        self.inner.node_timeout = timeout;
        self
    }

    /// Finish the config, rejecting values the server cannot run with
    pub fn build(self) -> Result<Config> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
