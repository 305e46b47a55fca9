//! Shard plan
//!
//! Computes shard boundaries for a payload.

use std::ops::Range;

use bytes::{Bytes, BytesMut};

use crate::error::{Result, StoreError};

/// Byte ranges of every shard of one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    /// Payload length in bytes
    total_len: usize,

    /// Number of shards
    shard_count: usize,

    /// ceil(total_len / shard_count)
    shard_size: usize,
}

impl ShardPlan {
    /// Plan `shard_count` shards over `total_len` bytes
    ///
    /// Fails with `NoNodesAvailable` when there is nobody to hold a shard.
    pub fn new(total_len: usize, shard_count: usize) -> Result<Self> {
        if shard_count == 0 {
            return Err(StoreError::NoNodesAvailable);
        }

        Ok(Self {
            total_len,
            shard_count,
            shard_size: total_len.div_ceil(shard_count),
        })
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Size of every full shard
    pub fn shard_size(&self) -> usize {
        self.shard_size
    }

    /// Payload length
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Byte range of shard `index`; empty past the end of the payload
    pub fn range(&self, index: usize) -> Range<usize> {
        let start = (index * self.shard_size).min(self.total_len);
        let end = ((index + 1) * self.shard_size).min(self.total_len);
        start..end
    }

    /// All shard ranges in order
    pub fn ranges(&self) -> Vec<Range<usize>> {
        (0..self.shard_count).map(|i| self.range(i)).collect()
    }

    /// Split `payload` into shards (zero-copy slices)
    pub fn split(&self, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.len() != self.total_len {
            return Err(StoreError::Protocol(format!(
                "payload is {} bytes, plan covers {}",
                payload.len(),
                self.total_len
            )));
        }

        Ok(self.ranges().into_iter().map(|r| payload.slice(r)).collect())
    }

    /// Concatenate shards back into the original payload, in order
    pub fn reassemble<I>(shards: I) -> Bytes
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut out = BytesMut::new();
        for shard in shards {
            out.extend_from_slice(&shard);
        }
        out.freeze()
    }
}
