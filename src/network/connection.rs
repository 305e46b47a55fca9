//! Connection Handler
//!
//! One coordinator connection: role byte, one request, one response.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::Coordinator;
use crate::error::{Result, StoreError};
use crate::protocol::{read_request, read_role, write_response, Request, Response, Role};

/// Serves a single client or node connection
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    coordinator: Arc<Coordinator>,

    /// Peer address for logging
    peer: String,
}

impl Connection {
    pub fn new(stream: TcpStream, coordinator: Arc<Coordinator>) -> Result<Self> {
        let peer = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            coordinator,
            peer,
        })
    }

    /// Bound every read and write on the connection
    ///
    /// Both halves share one socket, so setting it once covers both.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        let socket = self.reader.get_ref();
        socket.set_read_timeout(Some(timeout))?;
        socket.set_write_timeout(Some(timeout))?;
        Ok(())
    }

    /// Serve the connection to completion
    ///
    /// A peer that hangs up before sending a full request is not an error.
    /// A peer that stalls past the timeout gets a PROTOCOL_ERROR, and anything
    /// else that fails while reading is answered with the matching error
    /// status before the connection closes.
    pub fn handle(&mut self) -> Result<()> {
        let request = match self.receive() {
            Ok(request) => request,
            Err(StoreError::Io(ref e)) if peer_closed(e.kind()) => {
                tracing::debug!("{} closed without a request", self.peer);
                return Ok(());
            }
            Err(StoreError::Io(ref e)) if timed_out(e.kind()) => {
                tracing::warn!("{} sent no complete request in time", self.peer);
                let response = Response::protocol_error("timed out waiting for the request");
                let _ = write_response(&mut self.writer, &response);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Rejecting request from {}: {}", self.peer, e);
                let _ = write_response(&mut self.writer, &Response::from_error(&e));
                return Err(e);
            }
        };

        let kind = request.request_type();
        let response = match self.coordinator.execute(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("{:?} from {} failed: {}", kind, self.peer, e);
                Response::from_error(&e)
            }
        };

        match write_response(&mut self.writer, &response) {
            Err(StoreError::Io(ref e)) if peer_closed(e.kind()) || timed_out(e.kind()) => {
                tracing::debug!("{} left before its {:?} response", self.peer, kind);
                Ok(())
            }
            other => other,
        }
    }

    /// Role byte, then the request it announces
    fn receive(&mut self) -> Result<Request> {
        let role = read_role(&mut self.reader)?;
        let request = read_request(&mut self.reader)?;

        if request.role() != role {
            return Err(StoreError::Protocol(format!(
                "{:?} is not allowed on a {:?} connection",
                request.request_type(),
                role
            )));
        }
        if role == Role::Node {
            tracing::debug!("Node handshake from {}", self.peer);
        }

        Ok(request)
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer
    }
}

/// Errors that mean the peer hung up
fn peer_closed(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}

/// Errors a socket timeout surfaces as (platform dependent)
fn timed_out(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
