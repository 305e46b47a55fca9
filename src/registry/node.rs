//! Node definitions

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// What a storage node announces about itself during the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Host the node listens on
    pub address: String,

    /// Port the node listens on
    pub port: u16,

    /// Directory the node stores shards in
    pub storage_path: String,
}

impl NodeDescriptor {
    pub fn new(address: impl Into<String>, port: u16, storage_path: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port,
            storage_path: storage_path.into(),
        }
    }

    /// Reject descriptors that cannot be written to the metadata log
    ///
    /// The address ends up in `host:port` and the storage path prefixes every
    /// shard path, and both share a line with `;`, TAB and newline as
    /// delimiters.
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty()
            || self
                .address
                .chars()
                .any(|c| c == ':' || c == ';' || c.is_whitespace() || c.is_control())
        {
            return Err(StoreError::Protocol(format!(
                "invalid node address {:?}",
                self.address
            )));
        }
        if self.storage_path.is_empty()
            || self
                .storage_path
                .chars()
                .any(|c| c == ';' || c.is_control())
        {
            return Err(StoreError::Protocol(format!(
                "invalid node storage path {:?}",
                self.storage_path
            )));
        }
        Ok(())
    }
}

/// A registered storage node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Registry-assigned id, stable for the process lifetime
    pub id: u32,

    pub address: String,
    pub port: u16,
    pub storage_path: String,
}

impl Node {
    /// Build a node from its descriptor and assigned id
    pub fn from_descriptor(id: u32, descriptor: NodeDescriptor) -> Self {
        Self {
            id,
            address: descriptor.address,
            port: descriptor.port,
            storage_path: descriptor.storage_path,
        }
    }

    /// "host:port" used to reach the node
    pub fn addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Where a shard named `shard_name` lives on this node
    ///
    /// "/data/node1" + "a.txt.part1" → "/data/node1/a.txt.part1"
    pub fn shard_path(&self, shard_name: &str) -> String {
        let base = self.storage_path.trim_end_matches('/');
        format!("{}/{}", base, shard_name)
    }
}
