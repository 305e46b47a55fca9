//! shardstore Storage Node Binary
//!
//! Serves shards from a local directory after registering with a
//! coordinator.

use std::time::Duration;

use clap::Parser;
use shardstore::node::StorageNode;
use tracing_subscriber::{fmt, EnvFilter};

/// shardstore storage node
#[derive(Parser, Debug)]
#[command(name = "shardstore-node")]
#[command(about = "Storage node of a minimal sharded file store")]
#[command(version)]
struct Args {
    /// Directory shards are stored in
    #[arg(short, long, default_value = "./shardstore_node")]
    storage_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6001")]
    listen: String,

    /// Host the coordinator should dial to reach this node
    #[arg(short, long, default_value = "127.0.0.1")]
    advertise: String,

    /// Coordinator address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    coordinator: String,

    /// Seconds to wait for the coordinator's registration ack
    #[arg(long, default_value = "5")]
    register_timeout_secs: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("shardstore node v{}", shardstore::VERSION);

    let node = match StorageNode::bind(&args.listen, &args.storage_dir) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    let timeout = Duration::from_secs(args.register_timeout_secs);
    match node.register_with(&args.coordinator, &args.advertise, timeout) {
        Ok(id) => tracing::info!("Serving as node {} from {}", id, node.storage_dir().display()),
        Err(e) => {
            tracing::error!("Failed to register with {}: {}", args.coordinator, e);
            std::process::exit(1);
        }
    }

    if let Err(e) = node.run() {
        tracing::error!("Node error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Node stopped");
}
