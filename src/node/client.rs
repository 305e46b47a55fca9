//! Node client
//!
//! Issues shard calls to storage nodes over TCP.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::protocol::{
    decode_shard_body, read_response, write_node_command, NodeCommand, Response,
};

/// Shard operations the coordinator needs from a storage node
///
/// `node` is the "host:port" recorded for the node. Implementations must be
/// usable from many connection threads at once.
pub trait NodeClient: Send + Sync {
    /// Store `data` as `shard_name` in the node's storage directory
    fn store(&self, node: &str, shard_name: &str, data: Bytes) -> Result<()>;

    /// Read back the shard at `path`
    fn retrieve(&self, node: &str, path: &str) -> Result<Bytes>;

    /// Delete the shard at `path`
    fn delete(&self, node: &str, path: &str) -> Result<()>;
}

/// `NodeClient` speaking the node protocol, one connection per call
pub struct TcpNodeClient {
    /// Bound on connect, read and write
    timeout: Duration,
}

impl TcpNodeClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Send one command and wait for its response
    ///
    /// Transport failures become `NodeUnavailable`; the response itself is
    /// returned as-is for the caller to interpret.
    fn call(&self, node: &str, command: &NodeCommand) -> Result<Response> {
        let addr = resolve(node)?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| StoreError::node_unavailable(node, e))?;

        let exchange = || -> Result<Response> {
            stream.set_read_timeout(Some(self.timeout))?;
            stream.set_write_timeout(Some(self.timeout))?;
            stream.set_nodelay(true)?;

            let mut writer = BufWriter::new(stream.try_clone()?);
            write_node_command(&mut writer, command)?;

            let mut reader = BufReader::new(&stream);
            read_response(&mut reader)
        };

        exchange().map_err(|e| match e {
            StoreError::Io(io) => StoreError::node_unavailable(node, io),
            other => other,
        })
    }

    /// Map a non-OK node response to an error
    fn check(node: &str, response: Response) -> Result<Option<Vec<u8>>> {
        response.into_result().map_err(|e| match e {
            StoreError::ShardCorruption(_) | StoreError::NotFound(_) => e,
            other => StoreError::node_unavailable(node, other),
        })
    }
}

impl NodeClient for TcpNodeClient {
    fn store(&self, node: &str, shard_name: &str, data: Bytes) -> Result<()> {
        let command = NodeCommand::Store {
            shard_name: shard_name.to_string(),
            data,
        };
        let response = self.call(node, &command)?;
        Self::check(node, response)?;
        Ok(())
    }

    fn retrieve(&self, node: &str, path: &str) -> Result<Bytes> {
        let command = NodeCommand::Retrieve {
            path: path.to_string(),
        };
        let response = self.call(node, &command)?;
        let body = Self::check(node, response)?.unwrap_or_default();
        decode_shard_body(path, &body)
    }

    fn delete(&self, node: &str, path: &str) -> Result<()> {
        let command = NodeCommand::Remove {
            path: path.to_string(),
        };
        let response = self.call(node, &command)?;
        Self::check(node, response)?;
        Ok(())
    }
}

fn resolve(node: &str) -> Result<SocketAddr> {
    node.to_socket_addrs()
        .map_err(|e| StoreError::node_unavailable(node, e))?
        .next()
        .ok_or_else(|| StoreError::node_unavailable(node, "address did not resolve"))
}
