//! Node registry implementation
//!
//! Vec-based registry with RwLock for concurrency.

use parking_lot::RwLock;

use crate::error::Result;

use super::{Node, NodeDescriptor};

/// Ordered table of registered nodes
///
/// Registry position is significant: shard `i` of an upload goes to the
/// node at position `i` of the snapshot taken for that upload.
pub struct NodeRegistry {
    nodes: RwLock<Vec<Node>>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// Register a node and return its assigned id
    ///
    /// Malformed descriptors are rejected before an id is taken. Count and
    /// append happen under one write lock, so concurrent registrations never
    /// share an id.
    pub fn register(&self, descriptor: NodeDescriptor) -> Result<u32> {
        descriptor.validate()?;

        let mut nodes = self.nodes.write();
        let id = nodes.len() as u32 + 1;
        nodes.push(Node::from_descriptor(id, descriptor));
        Ok(id)
    }

    /// Snapshot of the registry in registration order
    pub fn list(&self) -> Vec<Node> {
        self.nodes.read().clone()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
