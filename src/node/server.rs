//! Storage node
//!
//! Minimal shard server: keeps every shard as one file in its storage
//! directory and registers itself with a coordinator.

use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::metadata::FileRecord;
use crate::network::{accept_loop, ShutdownHandle};
use crate::protocol::{
    encode_shard_body, read_node_command, read_response, write_request, write_response,
    write_role, NodeCommand, Request, Response, Role,
};
use crate::registry::NodeDescriptor;

/// A storage node serving STORE / RETRIEVE / REMOVE
pub struct StorageNode {
    listener: TcpListener,
    storage_dir: PathBuf,
    shutdown: ShutdownHandle,
}

impl StorageNode {
    /// Bind `listen_addr` and serve shards out of `storage_dir`
    pub fn bind(listen_addr: &str, storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        fs::create_dir_all(&storage_dir)?;
        let listener = TcpListener::bind(listen_addr)?;

        Ok(Self {
            listener,
            storage_dir,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Directory shards are kept in
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Descriptor announcing this node at `advertised_host`
    pub fn descriptor(&self, advertised_host: &str) -> Result<NodeDescriptor> {
        Ok(NodeDescriptor::new(
            advertised_host,
            self.local_addr()?.port(),
            self.storage_dir.to_string_lossy(),
        ))
    }

    /// Perform the NODE handshake with a coordinator and return the id it
    /// assigned
    pub fn register_with(
        &self,
        coordinator_addr: &str,
        advertised_host: &str,
        timeout: Duration,
    ) -> Result<u32> {
        let descriptor = self.descriptor(advertised_host)?;

        let stream = TcpStream::connect(coordinator_addr)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        let mut writer = BufWriter::new(stream.try_clone()?);
        write_role(&mut writer, Role::Node)?;
        write_request(&mut writer, &Request::Register(descriptor))?;

        let mut reader = BufReader::new(stream);
        let body = read_response(&mut reader)?.into_result()?.unwrap_or_default();
        let id: [u8; 4] = body.as_slice().try_into().map_err(|_| {
            StoreError::Protocol(format!("registration ack of {} bytes", body.len()))
        })?;

        let id = u32::from_be_bytes(id);
        tracing::info!("Registered with coordinator {} as node {}", coordinator_addr, id);
        Ok(id)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serve shard calls (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Storage node listening on {}, storing in {}",
            self.local_addr()?,
            self.storage_dir.display()
        );

        let storage_dir = self.storage_dir.clone();
        accept_loop(&self.listener, &self.shutdown, "shardstore-node", move |stream| {
            if let Err(e) = serve(stream, &storage_dir) {
                tracing::debug!("Node connection ended with error: {}", e);
            }
        })
    }
}

/// Answer one node command on `stream`
fn serve(stream: TcpStream, storage_dir: &Path) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    let response = match read_node_command(&mut reader).and_then(|c| execute(c, storage_dir)) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Shard call failed: {}", e);
            Response::from_error(&e)
        }
    };

    write_response(&mut writer, &response)
}

fn execute(command: NodeCommand, storage_dir: &Path) -> Result<Response> {
    match command {
        NodeCommand::Store { shard_name, data } => {
            let path = shard_file(storage_dir, &shard_name)?;
            fs::write(&path, &data)?;
            tracing::debug!("Stored {} ({} bytes)", path.display(), data.len());
            Ok(Response::ok(None))
        }
        NodeCommand::Retrieve { path } => {
            let file = shard_file_for_path(storage_dir, &path)?;
            match fs::read(&file) {
                Ok(data) => Ok(Response::ok(Some(encode_shard_body(&data)))),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path)),
                Err(e) => Err(e.into()),
            }
        }
        NodeCommand::Remove { path } => {
            let file = shard_file_for_path(storage_dir, &path)?;
            match fs::remove_file(&file) {
                Ok(()) => {
                    tracing::debug!("Removed {}", file.display());
                    Ok(Response::ok(None))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path)),
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// Shard file for a bare shard name, confined to `storage_dir`
fn shard_file(storage_dir: &Path, shard_name: &str) -> Result<PathBuf> {
    FileRecord::validate_name(shard_name)?;
    Ok(storage_dir.join(shard_name))
}

/// Shard file for a recorded location path
///
/// Only the final component is used, so a path can never reach outside
/// `storage_dir`.
fn shard_file_for_path(storage_dir: &Path, path: &str) -> Result<PathBuf> {
    let name = path.rsplit('/').next().unwrap_or(path);
    shard_file(storage_dir, name)
}
