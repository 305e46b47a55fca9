//! Sharding Module
//!
//! Splits a payload into contiguous byte ranges and maps ranges to nodes.
//!
//! ## Layout
//! For a payload of `len` bytes and `n` nodes:
//! ```text
//! shard_size = ceil(len / n)
//! shard i    = [i * shard_size, min((i + 1) * shard_size, len))
//! ```
//! Trailing shards are empty when `len < n`.
//!
//! ## Placement
//! Files are pinned to the node set seen at upload time. Registering more
//! nodes later does not reshard existing files.

mod plan;

pub use plan::ShardPlan;

use crate::registry::Node;

/// How shards are assigned to registered nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Shard `i` goes to registry position `i`
    #[default]
    Positional,
}

impl Placement {
    /// Pick the node for every shard of a plan over `nodes`
    pub fn assign<'a>(&self, plan: &ShardPlan, nodes: &'a [Node]) -> Vec<&'a Node> {
        match self {
            Placement::Positional => nodes.iter().take(plan.shard_count()).collect(),
        }
    }
}

/// Name of shard `index` (0-based) of `file_name`
///
/// ("a.txt", 0) → "a.txt.part1"
pub fn shard_name(file_name: &str, index: usize) -> String {
    format!("{}.part{}", file_name, index + 1)
}
