//! Node Store - Cached Persistence of Node Records
//!
//! The store owns every node record of one project. Reads are served from an
//! in-memory cache that is warmed lazily from the persistence backend; all
//! writes are serialized behind a single write lock and reach the cache only
//! after the backend has accepted them.
//!
//! # Examples
//!
//! ```rust
//! use rulegraph_core::models::{NodeKind, PayloadMap};
//! use rulegraph_core::services::NodeStore;
//! use serde_json::json;
//!
//! let store = NodeStore::in_memory();
//! let payload: PayloadMap = json!({"name": "person", "type": "object"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//! let id = store.create(NodeKind::Listener, payload).unwrap();
//!
//! assert_eq!(store.get(&id).unwrap().kind(), NodeKind::Listener);
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::error::GraphError;
use super::relationship_engine::purge_staged_references;
use super::staging::{NodeCache, StagedGraph};
use crate::config::GraphConfig;
use crate::db::{apply_batch, BatchEntry, JsonDirPersistence, MemoryPersistence, NodePersistence};
use crate::models::{validate_id, NodeKind, NodePayload, NodeRecord, PayloadMap};

/// Which records a mutation needs resident before it stages changes
pub(crate) enum Warmup<'a> {
    /// Every record (scans for references, whole-graph imports)
    All,
    /// Only the named records
    Ids(&'a [&'a str]),
}

pub struct NodeStore {
    backend: Arc<dyn NodePersistence>,
    cache: RwLock<NodeCache>,
    /// Serializes every mutation, cache warm-up and cache clear
    write_lock: Mutex<()>,
    accessories_enabled: bool,
}

impl NodeStore {
    pub fn new(backend: Arc<dyn NodePersistence>) -> Self {
        Self {
            backend,
            cache: RwLock::new(NodeCache::default()),
            write_lock: Mutex::new(()),
            accessories_enabled: true,
        }
    }

    /// Store backed by memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPersistence::new()))
    }

    /// Store backed by a JSON record directory
    pub fn open_dir(dir: impl AsRef<Path>, config: &GraphConfig) -> Result<Self, GraphError> {
        let backend = JsonDirPersistence::new(dir.as_ref(), config.persistence.clone())?;
        Ok(Self::new(Arc::new(backend)).with_accessories(config.accessories_enabled))
    }

    pub fn with_accessories(mut self, enabled: bool) -> Self {
        self.accessories_enabled = enabled;
        self
    }

    pub fn accessories_enabled(&self) -> bool {
        self.accessories_enabled
    }

    /// Reject kinds that are switched off for this store
    pub fn ensure_kind_enabled(&self, kind: NodeKind) -> Result<(), GraphError> {
        if kind == NodeKind::Accessory && !self.accessories_enabled {
            return Err(GraphError::invalid_kind(format!(
                "{} (accessories are disabled)",
                kind
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------

    /// Create a node of `kind` from a flat payload map; returns the new id
    pub fn create(&self, kind: NodeKind, payload: PayloadMap) -> Result<String, GraphError> {
        self.ensure_kind_enabled(kind)?;
        let payload = NodePayload::from_map(kind, payload)?;
        self.create_typed(payload)
    }

    /// Create a node from an already-typed payload; returns the new id
    pub fn create_typed(&self, payload: NodePayload) -> Result<String, GraphError> {
        self.ensure_kind_enabled(payload.kind())?;
        let record = NodeRecord::new(payload);
        let id = record.id().to_string();
        let kind = record.kind();

        self.mutate(Warmup::Ids(&[]), |staged| {
            staged.insert(record);
            Ok(())
        })?;

        info!("Created {} node {}", kind, id);
        Ok(id)
    }

    /// Fetch a node, loading it from the backend on a cache miss
    pub fn get(&self, id: &str) -> Result<NodeRecord, GraphError> {
        if validate_id(id).is_err() {
            return Err(GraphError::not_found(id));
        }
        if let Some(record) = self.read_cache()?.get(id) {
            return Ok(record.clone());
        }

        let _guard = self.lock_writes()?;
        self.load_locked(id)?;
        self.read_cache()?
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::not_found(id))
    }

    /// All nodes, optionally filtered by kind, in store order
    pub fn list(&self, kind: Option<NodeKind>) -> Result<Vec<NodeRecord>, GraphError> {
        self.read_warm(|cache| {
            Ok(cache
                .iter()
                .filter(|record| kind.map_or(true, |k| record.kind() == k))
                .cloned()
                .collect())
        })
    }

    /// Re-persist the cached state of one node
    pub fn save(&self, id: &str) -> Result<(), GraphError> {
        let _guard = self.lock_writes()?;
        let record = self
            .read_cache()?
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::not_cached(id))?;
        self.backend.write(&record)?;
        debug!("Saved node {}", id);
        Ok(())
    }

    /// Re-persist every cached node
    pub fn save_all(&self) -> Result<usize, GraphError> {
        let _guard = self.lock_writes()?;
        let records: Vec<NodeRecord> = self.read_cache()?.iter().cloned().collect();
        for record in &records {
            self.backend.write(record)?;
        }
        debug!("Saved {} cached node(s)", records.len());
        Ok(records.len())
    }

    /// Delete a node and every reference to it
    ///
    /// Returns `false` when the node did not exist (nothing is written).
    pub fn delete(&self, id: &str) -> Result<bool, GraphError> {
        let deleted = self.mutate(Warmup::All, |staged| {
            if !staged.contains(id) {
                return Ok(false);
            }
            purge_staged_references(staged, id);
            staged.remove(id);
            Ok(true)
        })?;

        if deleted {
            info!("Deleted node {}", id);
        }
        Ok(deleted)
    }

    /// Drop every cached record; the next read reloads from the backend
    pub fn clear_cache(&self) -> Result<(), GraphError> {
        let _guard = self.lock_writes()?;
        self.write_cache()?.clear();
        debug!("Cleared node cache");
        Ok(())
    }

    pub fn contains(&self, id: &str) -> Result<bool, GraphError> {
        match self.get(id) {
            Ok(_) => Ok(true),
            Err(GraphError::NotFound { .. }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Number of nodes in the project
    pub fn len(&self) -> Result<usize, GraphError> {
        self.read_warm(|cache| Ok(cache.len()))
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        Ok(self.len()? == 0)
    }

    /// Whether every durable record is resident in the cache
    pub fn is_warm(&self) -> bool {
        self.read_cache().map(|cache| cache.is_warm()).unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Crate-internal plumbing
    // ------------------------------------------------------------------

    /// Run a read against a fully warmed cache
    pub(crate) fn read_warm<T>(
        &self,
        read: impl FnOnce(&NodeCache) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        {
            let cache = self.read_cache()?;
            if cache.is_warm() {
                return read(&cache);
            }
        }

        // Hold the write lock through the read so a concurrent clear cannot empty the cache
        let _guard = self.lock_writes()?;
        self.warm_locked()?;
        let cache = self.read_cache()?;
        read(&cache)
    }

    /// Stage changes against the cache and commit them as one batch
    ///
    /// The closure sees a copy-on-write view; if it fails nothing is written.
    pub(crate) fn mutate<T>(
        &self,
        warmup: Warmup<'_>,
        stage: impl FnOnce(&mut StagedGraph<'_>) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        let _guard = self.lock_writes()?;
        match warmup {
            Warmup::All => self.warm_locked()?,
            Warmup::Ids(ids) => {
                for id in ids {
                    self.load_locked(id)?;
                }
            }
        }

        let (value, batch) = {
            let cache = self.read_cache()?;
            let mut staged = StagedGraph::new(&cache);
            let value = stage(&mut staged)?;
            let batch: Vec<BatchEntry> = staged
                .into_changes()
                .into_iter()
                .map(|op| BatchEntry {
                    previous: cache.get(op.id()).cloned(),
                    op,
                })
                .collect();
            (value, batch)
        };

        if !batch.is_empty() {
            apply_batch(self.backend.as_ref(), &batch)?;
            let mut cache = self.write_cache()?;
            for entry in batch {
                cache.apply(entry.op);
            }
        }
        Ok(value)
    }

    /// Load every durable record the cache does not hold yet. Caller holds the write lock.
    fn warm_locked(&self) -> Result<(), GraphError> {
        if self.read_cache()?.is_warm() {
            return Ok(());
        }
        let records = self.backend.load_all()?;
        let mut cache = self.write_cache()?;
        let loaded = records.len();
        for record in records {
            cache.insert_missing(record);
        }
        cache.mark_warm();
        debug!("Warmed node cache with {} record(s)", loaded);
        Ok(())
    }

    /// Load one record on a cache miss. Caller holds the write lock.
    fn load_locked(&self, id: &str) -> Result<(), GraphError> {
        let cache = self.read_cache()?;
        if cache.contains(id) || cache.is_warm() {
            return Ok(());
        }
        drop(cache);

        if let Some(record) = self.backend.load(id)? {
            self.write_cache()?.insert_missing(record);
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, GraphError> {
        self.write_lock
            .lock()
            .map_err(|_| GraphError::lock_poisoned("node store write lock"))
    }

    fn read_cache(&self) -> Result<RwLockReadGuard<'_, NodeCache>, GraphError> {
        self.cache
            .read()
            .map_err(|_| GraphError::lock_poisoned("node cache"))
    }

    fn write_cache(&self) -> Result<RwLockWriteGuard<'_, NodeCache>, GraphError> {
        self.cache
            .write()
            .map_err(|_| GraphError::lock_poisoned("node cache"))
    }
}

impl std::fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStore")
            .field("accessories_enabled", &self.accessories_enabled)
            .field("warm", &self.is_warm())
            .finish()
    }
}
