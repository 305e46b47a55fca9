//! Node Module
//!
//! Everything that talks to storage nodes.
//!
//! ## Calls
//! - `STORE(shardName, bytes)`: persist a shard, acknowledged
//! - `RETRIEVE(path) -> bytes`: read a shard back
//! - `REMOVE(path)`: delete a shard
//!
//! Every call opens its own connection and is bounded by the configured
//! node timeout; failures surface as `NodeUnavailable`.

mod client;
mod server;

pub use client::{NodeClient, TcpNodeClient};
pub use server::StorageNode;
