//! Coordinator Module
//!
//! The core of the file store: ties the node registry, the metadata log and
//! the node client together.
//!
//! ## Responsibilities
//! - Register storage nodes
//! - Split uploads into shards and distribute them
//! - Reassemble downloads from shards
//! - Delete files and their shards
//! - Report file names and shard placement

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::metadata::{FileRecord, Location, MetadataLog};
use crate::node::{NodeClient, TcpNodeClient};
use crate::protocol::{Distribution, Request, Response, DELETE_SUCCESS};
use crate::registry::{NodeDescriptor, NodeRegistry};
use crate::sharding::{shard_name, Placement, ShardPlan};

/// The coordinator
///
/// ## Concurrency Model
///
/// Every connection runs on its own thread and calls into one shared
/// `Coordinator`.
///
/// - **Registry**: RwLock inside `NodeRegistry`; an upload works from a single
///   snapshot, so a registration racing with it cannot change its shard count
/// - **Metadata log**: single-writer lock inside `MetadataLog`; appends and
///   rewrites never interleave
/// - **Uploads**: a name is reserved for the whole upload, so two uploads of
///   the same name cannot both store shards and append a record
///
/// Node calls happen outside every lock, so a slow node stalls only the
/// request that is waiting on it.
pub struct Coordinator {
    /// Coordinator configuration
    config: Config,

    /// Registered storage nodes
    registry: NodeRegistry,

    /// Durable file → shard placement
    log: MetadataLog,

    /// Transport used for STORE / RETRIEVE / REMOVE
    nodes: Arc<dyn NodeClient>,

    /// Shard → node policy
    placement: Placement,

    /// Names with an upload in flight
    uploads: Mutex<HashSet<String>>,
}

impl Coordinator {
    /// Open a coordinator that reaches nodes over TCP
    ///
    /// On startup:
    /// 1. Create the data directory
    /// 2. Load the metadata log
    /// 3. Start with an empty node registry (nodes re-register)
    pub fn open(config: Config) -> Result<Self> {
        let nodes = Arc::new(TcpNodeClient::new(config.node_timeout));
        Self::with_node_client(config, nodes)
    }

    /// Open a coordinator with a custom node transport
    pub fn with_node_client(config: Config, nodes: Arc<dyn NodeClient>) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let log = MetadataLog::open(&config.log_path(), config.log_sync_strategy)?;
        tracing::info!(
            "Metadata log {} opened with {} records",
            log.path().display(),
            log.len()
        );

        Ok(Self {
            config,
            registry: NodeRegistry::new(),
            log,
            nodes,
            placement: Placement::default(),
            uploads: Mutex::new(HashSet::new()),
        })
    }

    /// Execute a request
    ///
    /// Routes requests to the matching handler and builds the OK response;
    /// errors are left to the caller to translate.
    pub fn execute(&self, request: Request) -> Result<Response> {
        match request {
            Request::Register(descriptor) => {
                let id = self.register_node(descriptor)?;
                Ok(Response::ok(Some(id.to_be_bytes().to_vec())))
            }
            Request::ListFiles => Response::ok_body(&self.list_files()),
            Request::Upload {
                name,
                declared_size,
                data,
            } => {
                self.upload(&name, declared_size, data)?;
                Ok(Response::ok(None))
            }
            Request::Download { name } => {
                let data = self.download(&name)?;
                Ok(Response::ok(Some(data.to_vec())))
            }
            Request::Delete { name } => {
                self.delete(&name)?;
                Ok(Response::ok(Some(DELETE_SUCCESS.as_bytes().to_vec())))
            }
            Request::Verify => Response::ok_body(&self.verify()),
        }
    }

    // =========================================================================
    // Node Registry
    // =========================================================================

    /// Register a storage node and return its id
    ///
    /// An address or storage path that would break the metadata log is
    /// rejected with `Protocol` and the node is not registered.
    pub fn register_node(&self, descriptor: NodeDescriptor) -> Result<u32> {
        let addr = format!("{}:{}", descriptor.address, descriptor.port);
        let storage_path = descriptor.storage_path.clone();
        let id = self.registry.register(descriptor).map_err(|e| {
            tracing::warn!("Refused node registration from {}: {}", addr, e);
            e
        })?;

        tracing::info!(
            "Storage node registered: id={}, addr={}, storage={}",
            id,
            addr,
            storage_path
        );
        Ok(id)
    }

    // =========================================================================
    // Sharding Engine
    // =========================================================================

    /// Split `data` across every registered node and record the placement
    ///
    /// Steps:
    /// 1. Validate the name and the declared size
    /// 2. Reserve the name (rejects existing and in-flight names)
    /// 3. Snapshot the registry and plan one shard per node
    /// 4. Store all shards in parallel
    /// 5. On any failure, remove the shards that did land and report
    ///    `PartialUploadFailure`; no record is written
    /// 6. Otherwise append the record
    pub fn upload(&self, name: &str, declared_size: u64, data: Bytes) -> Result<FileRecord> {
        FileRecord::validate_name(name)?;
        if declared_size != data.len() as u64 {
            return Err(StoreError::Protocol(format!(
                "declared size {} does not match payload of {} bytes",
                declared_size,
                data.len()
            )));
        }

        let _reservation = self.reserve(name)?;

        let nodes = self.registry.list();
        let plan = ShardPlan::new(data.len(), nodes.len())?;
        let shards = plan.split(&data)?;
        let targets = self.placement.assign(&plan, &nodes);

        tracing::debug!(
            "Uploading {} ({} bytes) as {} shards of {} bytes",
            name,
            plan.total_len(),
            plan.shard_count(),
            plan.shard_size()
        );

        let outcomes: Vec<Result<()>> = crossbeam::scope(|scope| {
            let handles: Vec<_> = shards
                .iter()
                .zip(targets.iter())
                .enumerate()
                .map(|(i, (shard, node))| {
                    let shard = shard.clone();
                    let part = shard_name(name, i);
                    let addr = node.addr();
                    scope.spawn(move |_| self.nodes.store(&addr, &part, shard))
                })
                .collect();

            handles
                .into_iter()
                .zip(targets.iter())
                .map(|(handle, node)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(StoreError::node_unavailable(node.addr(), "store thread panicked"))
                    })
                })
                .collect::<Vec<Result<()>>>()
        })
        .map_err(|_| StoreError::Remote("shard distribution panicked".to_string()))?;

        let locations: Vec<Location> = targets
            .iter()
            .enumerate()
            .map(|(i, node)| Location::new(node.shard_path(&shard_name(name, i)), node.addr()))
            .collect();

        let mut failed = Vec::new();
        for (i, outcome) in outcomes.iter().enumerate() {
            if let Err(e) = outcome {
                tracing::warn!("Shard {} of {} failed to store: {}", i, name, e);
                failed.push(i);
            }
        }

        if !failed.is_empty() {
            self.roll_back(name, &locations, &failed);
            return Err(StoreError::PartialUploadFailure { failed });
        }

        let record = FileRecord::new(name, data.len() as u64, locations);
        if let Err(e) = self.log.append(record.clone()) {
            tracing::warn!("Could not record {}: {}", name, e);
            self.roll_back(name, &record.locations, &[]);
            return Err(e);
        }

        tracing::info!(
            "Uploaded {} ({} bytes, {} shards)",
            name,
            record.total_size,
            record.shard_count()
        );
        Ok(record)
    }

    /// Best-effort removal of the shards of a failed upload that did land
    ///
    /// `failed` lists the shards that never reached their node.
    fn roll_back(&self, name: &str, locations: &[Location], failed: &[usize]) {
        for (i, location) in locations.iter().enumerate() {
            if failed.contains(&i) {
                continue;
            }
            if let Err(e) = self.nodes.delete(&location.node, &location.path) {
                tracing::warn!(
                    "Could not roll back shard {} of {} at {}: {}",
                    i,
                    name,
                    location.path,
                    e
                );
            }
        }
    }

    fn reserve(&self, name: &str) -> Result<UploadReservation<'_>> {
        let mut uploads = self.uploads.lock();
        if self.log.contains(name) || !uploads.insert(name.to_string()) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        Ok(UploadReservation {
            uploads: &self.uploads,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Reconstruction / Deletion
    // =========================================================================

    /// Fetch every shard of `name` in order and concatenate them
    ///
    /// `NotFound` only ever means `name` has no record; a shard the node no
    /// longer holds is reported as `ShardCorruption`.
    pub fn download(&self, name: &str) -> Result<Bytes> {
        let record = self.log.find(name)?;

        let mut shards = Vec::with_capacity(record.shard_count());
        for location in &record.locations {
            let shard = self
                .nodes
                .retrieve(&location.node, &location.path)
                .map_err(|e| match e {
                    // The file is still recorded, so a missing shard is damage
                    StoreError::NotFound(_) => StoreError::ShardCorruption(format!(
                        "shard {} of {} is missing on {}",
                        location.path, name, location.node
                    )),
                    other => other,
                })?;
            shards.push(shard);
        }

        let data = ShardPlan::reassemble(shards);
        if data.len() as u64 != record.total_size {
            return Err(StoreError::ShardCorruption(format!(
                "{} reassembled to {} bytes, expected {}",
                name,
                data.len(),
                record.total_size
            )));
        }

        tracing::debug!("Downloaded {} ({} bytes)", name, data.len());
        Ok(data)
    }

    /// Remove the record of `name`, then its shards
    ///
    /// The record goes first: a shard that cannot be deleted is left
    /// orphaned on its node (and logged) rather than leaving a record that
    /// points at missing shards.
    pub fn delete(&self, name: &str) -> Result<FileRecord> {
        let record = self.log.find_and_remove(name)?;

        for location in &record.locations {
            if let Err(e) = self.nodes.delete(&location.node, &location.path) {
                tracing::warn!(
                    "Shard {} of {} on {} left orphaned: {}",
                    location.path,
                    name,
                    location.node,
                    e
                );
            }
        }

        tracing::info!("Deleted {} ({} shards)", name, record.shard_count());
        Ok(record)
    }

    /// Shard placement of every file, from the log only
    ///
    /// Shards are not checked on the nodes. For a name recorded twice the
    /// first record wins.
    pub fn verify(&self) -> Distribution {
        let mut distribution = Distribution::new();
        for record in self.log.records() {
            let paths = record.paths();
            distribution.entry(record.name).or_insert(paths);
        }
        distribution
    }

    /// Every file name in upload order
    pub fn list_files(&self) -> Vec<String> {
        self.log.scan()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the node registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Get the metadata log
    pub fn log(&self) -> &MetadataLog {
        &self.log
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Holds an upload name until the upload finishes
struct UploadReservation<'a> {
    uploads: &'a Mutex<HashSet<String>>,
    name: String,
}

impl Drop for UploadReservation<'_> {
    fn drop(&mut self) {
        self.uploads.lock().remove(&self.name);
    }
}
