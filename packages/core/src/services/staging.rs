//! Copy-on-write view over the node cache
//!
//! Multi-node operations (linking, purging references on delete, canvas
//! import) stage every change here first. Nothing reaches disk or the cache
//! until the whole operation has succeeded and the staged changes are
//! committed as one batch.

use std::collections::HashMap;

use crate::db::WriteOp;
use crate::models::NodeRecord;

/// Insertion-ordered cache of loaded records
#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    nodes: HashMap<String, NodeRecord>,
    order: Vec<String>,
    warm: bool,
}

impl NodeCache {
    pub(crate) fn get(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Records in first-insertion order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_warm(&self) -> bool {
        self.warm
    }

    pub(crate) fn mark_warm(&mut self) {
        self.warm = true;
    }

    pub(crate) fn insert(&mut self, record: NodeRecord) {
        let id = record.id().to_string();
        if !self.nodes.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.nodes.insert(id, record);
    }

    /// Insert only if absent; cached state wins over freshly loaded state
    pub(crate) fn insert_missing(&mut self, record: NodeRecord) {
        if !self.contains(record.id()) {
            self.insert(record);
        }
    }

    pub(crate) fn remove(&mut self, id: &str) {
        if self.nodes.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.warm = false;
    }

    pub(crate) fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::Upsert(record) => self.insert(record),
            WriteOp::Remove(id) => self.remove(&id),
        }
    }
}

/// Pending changes layered over a borrowed cache
pub(crate) struct StagedGraph<'a> {
    base: &'a NodeCache,
    /// `None` marks a staged removal
    changes: HashMap<String, Option<NodeRecord>>,
    touched: Vec<String>,
    appended: Vec<String>,
}

impl<'a> StagedGraph<'a> {
    pub(crate) fn new(base: &'a NodeCache) -> Self {
        Self {
            base,
            changes: HashMap::new(),
            touched: Vec::new(),
            appended: Vec::new(),
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&NodeRecord> {
        match self.changes.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.base.get(id),
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access, cloning the cached record on first touch
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut NodeRecord> {
        if !self.changes.contains_key(id) {
            let record = self.base.get(id)?.clone();
            self.touch(id);
            self.changes.insert(id.to_string(), Some(record));
        }
        self.changes.get_mut(id).and_then(Option::as_mut)
    }

    pub(crate) fn insert(&mut self, record: NodeRecord) {
        let id = record.id().to_string();
        self.touch(&id);
        if !self.base.contains(&id) && !self.appended.contains(&id) {
            self.appended.push(id.clone());
        }
        self.changes.insert(id, Some(record));
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.touch(id);
        self.changes.insert(id.to_string(), None);
        true
    }

    /// Ids of live records: cached order first, then newly staged ones
    pub(crate) fn ids(&self) -> Vec<String> {
        self.base
            .iter()
            .map(|r| r.id().to_string())
            .chain(self.appended.iter().cloned())
            .filter(|id| self.contains(id))
            .collect()
    }

    /// Staged changes in first-touch order, dropping no-op rewrites
    pub(crate) fn into_changes(mut self) -> Vec<WriteOp> {
        let base = self.base;
        let touched = std::mem::take(&mut self.touched);
        touched
            .into_iter()
            .filter_map(|id| match self.changes.remove(&id) {
                Some(Some(record)) if base.get(&id) == Some(&record) => None,
                Some(Some(record)) => Some(WriteOp::Upsert(record)),
                Some(None) if base.contains(&id) => Some(WriteOp::Remove(id)),
                _ => None,
            })
            .collect()
    }

    fn touch(&mut self, id: &str) {
        if !self.changes.contains_key(id) {
            self.touched.push(id.to_string());
        }
    }
}
