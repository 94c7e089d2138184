//! In-Memory Backend
//!
//! Keeps records in insertion order behind a mutex. Used for tests,
//! benchmarks and throwaway projects.

use std::sync::{Arc, Mutex, MutexGuard};

use super::error::PersistenceError;
use super::persistence::NodePersistence;
use crate::models::NodeRecord;

#[derive(Clone, Default)]
pub struct MemoryPersistence {
    records: Arc<Mutex<Vec<NodeRecord>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with durable records
    pub fn with_records(records: Vec<NodeRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Number of durable records
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<NodeRecord>>, PersistenceError> {
        self.records
            .lock()
            .map_err(|e| PersistenceError::unavailable(format!("records lock poisoned: {}", e)))
    }
}

impl NodePersistence for MemoryPersistence {
    fn load(&self, id: &str) -> Result<Option<NodeRecord>, PersistenceError> {
        Ok(self.lock()?.iter().find(|r| r.id() == id).cloned())
    }

    fn load_all(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        Ok(self.lock()?.clone())
    }

    fn write(&self, record: &NodeRecord) -> Result<(), PersistenceError> {
        let mut records = self.lock()?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), PersistenceError> {
        self.lock()?.retain(|r| r.id() != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeKind, NodePayload};

    #[test]
    fn test_write_replaces_in_place() {
        let backend = MemoryPersistence::new();
        let first = NodeRecord::with_id("a", NodePayload::empty(NodeKind::Listener)).unwrap();
        let second = NodeRecord::with_id("b", NodePayload::empty(NodeKind::Listener)).unwrap();
        backend.write(&first).unwrap();
        backend.write(&second).unwrap();
        backend.write(&first).unwrap();

        let ids: Vec<String> = backend
            .load_all()
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        backend.remove("a").unwrap();
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.load("a").unwrap(), None);
    }
}
