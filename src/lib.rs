//! # shardstore
//!
//! A minimal sharded file store:
//! - A coordinator splits every upload into one contiguous shard per
//!   registered storage node
//! - A line-oriented metadata log records where each shard went
//! - Downloads gather the shards back in order; deletes remove them
//! - One request per TCP connection, one thread per connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │             (Clients and Storage Nodes)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  role: NODE | CLIENT
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Coordinator                                │
//! │      register / list / upload / download / delete / verify  │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!  ┌─────────────┐       ┌─────────────┐        ┌──────────────┐
//!  │  Registry   │       │ Metadata Log│        │ Node Client  │
//!  │  (RwLock)   │       │ (1 writer)  │        │ STORE/RETR/RM│
//!  └─────────────┘       └─────────────┘        └──────┬───────┘
//!                                                      │
//!                                                      ▼
//!                                              ┌──────────────┐
//!                                              │ Storage Nodes│
//!                                              └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod registry;
pub mod metadata;
pub mod sharding;
pub mod protocol;
pub mod node;
pub mod coordinator;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::Config;
pub use coordinator::Coordinator;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shardstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
