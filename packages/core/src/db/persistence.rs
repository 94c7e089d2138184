//! NodePersistence Trait - Durable Storage Abstraction
//!
//! This module defines the `NodePersistence` trait that sits between the
//! in-memory node store and the medium records are kept on. The store owns
//! caching and graph rules; a backend only reads and writes whole records.
//!
//! # Design Decisions
//!
//! 1. **Synchronous**: Records are small files; callers in async contexts can
//!    move calls onto a blocking thread
//! 2. **Whole-Record Writes**: `write` replaces the full record, never patches
//! 3. **Batches Are Compensated**: [`apply_batch`] undoes earlier writes of a
//!    batch when a later one fails, so a multi-record change is all-or-nothing

use tracing::{error, warn};

use super::error::PersistenceError;
use crate::models::NodeRecord;

/// Durable storage for node records
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the store shares one backend
/// between all callers.
pub trait NodePersistence: Send + Sync {
    /// Load a single record, `None` if it was never written or was removed
    fn load(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError>;

    /// Load every stored record
    fn load_all(&self) -> Result<Vec<NodeRecord>, PersistenceError>;

    /// Durably write (create or replace) a record
    fn write(&self, record: &NodeRecord) -> Result<(), PersistenceError>;

    /// Remove a record; removing an absent record succeeds
    fn remove(&self, id: &str) -> Result<(), PersistenceError>;
}

/// One staged change to durable state
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Upsert(NodeRecord),
    Remove(String),
}

impl WriteOp {
    pub fn id(&self) -> &str {
        match self {
            WriteOp::Upsert(record) => record.id(),
            WriteOp::Remove(id) => id,
        }
    }
}

/// A staged change together with the durable record it replaces
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub op: WriteOp,
    pub previous: Option<NodeRecord>,
}

/// Apply a batch of writes in order
///
/// On failure every entry already applied is restored to its `previous`
/// state (in reverse order) and the original error is returned.
pub fn apply_batch(
    backend: &dyn NodePersistence,
    batch: &[BatchEntry],
) -> Result<(), PersistenceError> {
    for (index, entry) in batch.iter().enumerate() {
        let result = match &entry.op {
            WriteOp::Upsert(record) => backend.write(record),
            WriteOp::Remove(id) => backend.remove(id),
        };

        if let Err(err) = result {
            warn!(
                "Write of node {} failed ({}), rolling back {} earlier write(s)",
                entry.op.id(),
                err,
                index
            );
            rollback(backend, &batch[..index]);
            return Err(err);
        }
    }
    Ok(())
}

fn rollback(backend: &dyn NodePersistence, applied: &[BatchEntry]) {
    for entry in applied.iter().rev() {
        let id = entry.op.id();
        let restored = match &entry.previous {
            Some(previous) => backend.write(previous),
            None => backend.remove(id),
        };
        if let Err(err) = restored {
            error!("Rollback of node {} failed: {}", id, err);
        }
    }
}
