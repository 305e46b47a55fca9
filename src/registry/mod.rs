//! Node Registry Module
//!
//! Tracks connected storage nodes and assigns stable identifiers.
//!
//! ## Responsibilities
//! - Reject descriptors the metadata log cannot carry
//! - Assign ids on registration (`count + 1`, never reused)
//! - Hand out consistent snapshots of the node list
//!
//! ## Lifetime
//! Nodes are never removed. There is no deregistration protocol, no
//! duplicate detection and no capacity limit: the same physical node
//! registering twice occupies two slots with independent shard assignments.

mod node;
mod table;

pub use node::{Node, NodeDescriptor};
pub use table::NodeRegistry;
