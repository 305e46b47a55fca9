//! Network Module
//!
//! Connection Dispatcher: TCP accept loop and per-connection handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per connection, one request per connection
//! - Requests routed through the Coordinator

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;

pub(crate) use server::accept_loop;
