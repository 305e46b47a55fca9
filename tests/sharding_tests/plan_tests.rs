//! Tests for the Sharding Engine
//!
//! These tests verify:
//! - Shard sizes follow ceil(len / n)
//! - Empty trailing shards when the payload is shorter than the node count
//! - Zero nodes is an explicit error
//! - Split + reassemble gives back the payload
//! - Positional placement

use bytes::Bytes;
use shardstore::registry::{Node, NodeDescriptor};
use shardstore::sharding::{shard_name, Placement, ShardPlan};
use shardstore::StoreError;

// =============================================================================
// Helper Functions
// =============================================================================

fn nodes(count: u32) -> Vec<Node> {
    (1..=count)
        .map(|i| Node::from_descriptor(i, NodeDescriptor::new("127.0.0.1", 6000 + i as u16, "/s")))
        .collect()
}

fn sizes(plan: &ShardPlan) -> Vec<usize> {
    plan.ranges().iter().map(|r| r.len()).collect()
}

// =============================================================================
// Plan Tests
// =============================================================================

#[test]
fn test_ten_bytes_over_three_nodes() {
    let plan = ShardPlan::new(10, 3).unwrap();

    assert_eq!(plan.shard_size(), 4);
    assert_eq!(sizes(&plan), vec![4, 4, 2]);
    assert_eq!(plan.range(0), 0..4);
    assert_eq!(plan.range(1), 4..8);
    assert_eq!(plan.range(2), 8..10);
}

#[test]
fn test_even_split() {
    let plan = ShardPlan::new(12, 4).unwrap();

    assert_eq!(sizes(&plan), vec![3, 3, 3, 3]);
}

#[test]
fn test_single_node_gets_everything() {
    let plan = ShardPlan::new(1000, 1).unwrap();

    assert_eq!(sizes(&plan), vec![1000]);
}

#[test]
fn test_payload_shorter_than_node_count() {
    let plan = ShardPlan::new(2, 5).unwrap();

    assert_eq!(sizes(&plan), vec![1, 1, 0, 0, 0]);
    assert_eq!(plan.range(4), 2..2);
}

#[test]
fn test_rounding_can_leave_trailing_shards_empty() {
    // ceil(5 / 4) = 2 → 2, 2, 1, 0
    let plan = ShardPlan::new(5, 4).unwrap();

    assert_eq!(sizes(&plan), vec![2, 2, 1, 0]);
}

#[test]
fn test_empty_payload() {
    let plan = ShardPlan::new(0, 3).unwrap();

    assert_eq!(plan.shard_size(), 0);
    assert_eq!(sizes(&plan), vec![0, 0, 0]);
}

#[test]
fn test_zero_nodes_is_an_error() {
    let result = ShardPlan::new(10, 0);

    assert!(matches!(result, Err(StoreError::NoNodesAvailable)));
}

#[test]
fn test_ranges_cover_payload_exactly() {
    for len in [0usize, 1, 7, 64, 1023] {
        for n in 1..=9 {
            let plan = ShardPlan::new(len, n).unwrap();
            let ranges = plan.ranges();

            assert_eq!(ranges.len(), n);
            assert_eq!(ranges[0].start, 0);
            assert_eq!(ranges[n - 1].end, len);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }
}

// =============================================================================
// Split / Reassemble Tests
// =============================================================================

#[test]
fn test_split_and_reassemble() {
    let payload = Bytes::from_static(b"0123456789");
    let plan = ShardPlan::new(payload.len(), 3).unwrap();

    let shards = plan.split(&payload).unwrap();

    assert_eq!(shards[0], Bytes::from_static(b"0123"));
    assert_eq!(shards[1], Bytes::from_static(b"4567"));
    assert_eq!(shards[2], Bytes::from_static(b"89"));
    assert_eq!(ShardPlan::reassemble(shards), payload);
}

#[test]
fn test_split_rejects_wrong_length() {
    let plan = ShardPlan::new(4, 2).unwrap();

    let result = plan.split(&Bytes::from_static(b"abc"));

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

// =============================================================================
// Placement Tests
// =============================================================================

#[test]
fn test_positional_placement() {
    let nodes = nodes(3);
    let plan = ShardPlan::new(10, nodes.len()).unwrap();

    let targets = Placement::Positional.assign(&plan, &nodes);

    let ids: Vec<u32> = targets.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_shard_names_are_one_based() {
    assert_eq!(shard_name("a.txt", 0), "a.txt.part1");
    assert_eq!(shard_name("a.txt", 2), "a.txt.part3");
}
