//! shardstore Coordinator Binary
//!
//! Starts the coordinator's TCP server.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use shardstore::config::LogSyncStrategy;
use shardstore::network::Server;
use shardstore::{Config, Coordinator};
use tracing_subscriber::{fmt, EnvFilter};

/// shardstore coordinator
#[derive(Parser, Debug)]
#[command(name = "shardstore-server")]
#[command(about = "Coordinator of a minimal sharded file store")]
#[command(version)]
struct Args {
    /// Data directory (holds the metadata log)
    #[arg(short, long, default_value = "./shardstore_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Timeout for every storage node call, in milliseconds
    #[arg(short, long, default_value = "5000")]
    node_timeout_ms: u64,

    /// Timeout for reading a request and writing its response, in seconds
    #[arg(long, default_value = "30")]
    client_timeout_secs: u64,

    /// Skip fsync after metadata log writes
    #[arg(long)]
    no_sync: bool,
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

    tracing::info!("shardstore coordinator v{}", shardstore::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.no_sync {
        LogSyncStrategy::OsBuffered
    } else {
        LogSyncStrategy::EveryWrite
    };

    let config = match Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .client_timeout(Duration::from_secs(args.client_timeout_secs))
        .node_timeout(Duration::from_millis(args.node_timeout_ms))
        .log_sync_strategy(sync_strategy)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let coordinator = match Coordinator::open(config.clone()) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("Failed to open coordinator: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, coordinator) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
