//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::{BufWriter, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::protocol::{write_response, Response};
use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable flag that stops an accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after its current poll
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for the coordinator
pub struct Server {
    config: Config,
    coordinator: Arc<Coordinator>,
    listener: TcpListener,
    shutdown: ShutdownHandle,

    /// Connections currently being served
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, coordinator: Arc<Coordinator>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;

        Ok(Self {
            config,
            coordinator,
            listener,
            shutdown: ShutdownHandle::new(),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Coordinator listening on {}", self.local_addr()?);

        let coordinator = Arc::clone(&self.coordinator);
        let active = Arc::clone(&self.active);
        let max_connections = self.config.max_connections;
        let client_timeout = self.config.client_timeout;

        accept_loop(&self.listener, &self.shutdown, "shardstore-conn", move |stream| {
            let _slot = ConnectionSlot::acquire(&active);
            if active.load(Ordering::SeqCst) > max_connections {
                reject(stream, "too many connections");
                return;
            }

            let mut connection = match Connection::new(stream, Arc::clone(&coordinator)) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Failed to set up connection: {}", e);
                    return;
                }
            };

            if let Err(e) = connection.set_timeout(client_timeout) {
                tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                return;
            }

            if let Err(e) = connection.handle() {
                tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
            }
        })?;

        tracing::info!("Coordinator stopped accepting connections");
        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Counts a connection as active for as long as it is alive
struct ConnectionSlot<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ConnectionSlot<'a> {
    fn acquire(active: &'a AtomicUsize) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ConnectionSlot<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Answer an over-limit connection with an error and close it
fn reject(stream: TcpStream, reason: &str) {
    tracing::warn!("Rejecting connection: {}", reason);
    let mut writer = BufWriter::new(stream);
    let _ = write_response(&mut writer, &Response::error(reason));
}

/// Accept connections until `shutdown` is set, running `handle` for each on
/// its own thread
///
/// The listener is polled non-blocking so a shutdown request is noticed
/// within `ACCEPT_POLL_INTERVAL`.
pub(crate) fn accept_loop<F>(
    listener: &TcpListener,
    shutdown: &ShutdownHandle,
    thread_name: &str,
    handle: F,
) -> Result<()>
where
    F: Fn(TcpStream) + Send + Sync + 'static,
{
    listener.set_nonblocking(true)?;
    let handle = Arc::new(handle);

    while !shutdown.is_shutdown() {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    tracing::warn!("Dropping connection from {}: {}", peer, e);
                    continue;
                }

                let handle = Arc::clone(&handle);
                let spawned = thread::Builder::new()
                    .name(thread_name.to_string())
                    .spawn(move || handle(stream));

                if let Err(e) = spawned {
                    tracing::warn!("Failed to spawn handler for {}: {}", peer, e);
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }

    Ok(())
}
