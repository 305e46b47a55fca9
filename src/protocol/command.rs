//! Command definitions
//!
//! Represents requests from clients and nodes, and calls to nodes.

use bytes::Bytes;

use crate::registry::NodeDescriptor;

/// What the peer of a coordinator connection is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    Node = 0x01,
    Client = 0x02,
}

impl Role {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Role::Node),
            0x02 => Some(Role::Client),
            _ => None,
        }
    }
}

/// Frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    ListFiles = 0x10,
    Upload = 0x11,
    Download = 0x12,
    Delete = 0x13,
    Verify = 0x14,
    Register = 0x20,
    Store = 0x30,
    Retrieve = 0x31,
    Remove = 0x32,
}

/// A parsed request to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Node handshake
    Register(NodeDescriptor),

    /// List every stored file name
    ListFiles,

    /// Store a file
    Upload {
        name: String,
        declared_size: u64,
        data: Bytes,
    },

    /// Fetch a file
    Download { name: String },

    /// Remove a file and its shards
    Delete { name: String },

    /// Report shard placement of every file
    Verify,
}

impl Request {
    /// Get the frame kind
    pub fn request_type(&self) -> RequestType {
        match self {
            Request::Register(_) => RequestType::Register,
            Request::ListFiles => RequestType::ListFiles,
            Request::Upload { .. } => RequestType::Upload,
            Request::Download { .. } => RequestType::Download,
            Request::Delete { .. } => RequestType::Delete,
            Request::Verify => RequestType::Verify,
        }
    }

    /// Role a connection must declare to send this request
    pub fn role(&self) -> Role {
        match self {
            Request::Register(_) => Role::Node,
            _ => Role::Client,
        }
    }
}

/// A call from the coordinator to a storage node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    /// Persist a shard under `shard_name` in the node's storage directory
    Store { shard_name: String, data: Bytes },

    /// Return the bytes of the shard at `path`
    Retrieve { path: String },

    /// Delete the shard at `path`
    Remove { path: String },
}

impl NodeCommand {
    /// Get the frame kind
    pub fn request_type(&self) -> RequestType {
        match self {
            NodeCommand::Store { .. } => RequestType::Store,
            NodeCommand::Retrieve { .. } => RequestType::Retrieve,
            NodeCommand::Remove { .. } => RequestType::Remove,
        }
    }
}
