//! Relationship Engine - Typed Links Between Nodes
//!
//! Enforces which kinds may point at which and answers traversal queries.
//! Relationships live only in each source node's `outgoing` list; inbound
//! lookups scan the store.
//!
//! Allowed connections:
//!
//! | Source    | Target    | Source cardinality  |
//! |-----------|-----------|---------------------|
//! | Condition | Listener  | at most one         |
//! | Listener  | Event     | many                |
//! | Listener  | Accessory | many                |
//!
//! Events and Accessories are terminal.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::error::GraphError;
use super::node_store::{NodeStore, Warmup};
use super::staging::{NodeCache, StagedGraph};
use crate::models::{FullChain, ListenerBranch, NodeKind, NodeRecord};

/// Source → target kind pairs that may be linked
pub const ALLOWED_CONNECTIONS: [(NodeKind, NodeKind); 3] = [
    (NodeKind::Condition, NodeKind::Listener),
    (NodeKind::Listener, NodeKind::Event),
    (NodeKind::Listener, NodeKind::Accessory),
];

pub fn connection_allowed(source: NodeKind, target: NodeKind) -> bool {
    ALLOWED_CONNECTIONS.contains(&(source, target))
}

/// What a successful `link` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    /// The source already pointed at the target; nothing was written
    AlreadyLinked,
}

/// Validate and stage a single link
pub(crate) fn stage_link(
    graph: &mut StagedGraph<'_>,
    source_id: &str,
    target_id: &str,
) -> Result<LinkOutcome, GraphError> {
    let source = graph
        .get(source_id)
        .ok_or_else(|| GraphError::not_found(source_id))?;
    let target = graph
        .get(target_id)
        .ok_or_else(|| GraphError::not_found(target_id))?;

    let source_kind = source.kind();
    let target_kind = target.kind();
    if source_id == target_id || !connection_allowed(source_kind, target_kind) {
        return Err(GraphError::IllegalConnection {
            source_id: source_id.to_string(),
            source_kind,
            target_id: target_id.to_string(),
            target_kind,
        });
    }

    // A linked condition must be unlinked before any relink, same listener included
    if source_kind == NodeKind::Condition {
        if let Some(existing) = source.outgoing().first() {
            return Err(GraphError::ConditionAlreadyLinked {
                condition_id: source_id.to_string(),
                listener_id: existing.clone(),
            });
        }
    }

    if source.points_to(target_id) {
        return Ok(LinkOutcome::AlreadyLinked);
    }

    if let Some(source) = graph.get_mut(source_id) {
        source.push_outgoing(target_id);
    }
    Ok(LinkOutcome::Linked)
}

/// Stage removal of a single link; `false` if it was absent
pub(crate) fn stage_unlink(
    graph: &mut StagedGraph<'_>,
    source_id: &str,
    target_id: &str,
) -> Result<bool, GraphError> {
    let source = graph
        .get(source_id)
        .ok_or_else(|| GraphError::not_found(source_id))?;
    if !source.points_to(target_id) {
        return Ok(false);
    }
    Ok(graph
        .get_mut(source_id)
        .map_or(false, |source| source.remove_outgoing(target_id)))
}

/// Stage removal of `target_id` from every outgoing set; returns changed ids
pub(crate) fn purge_staged_references(graph: &mut StagedGraph<'_>, target_id: &str) -> Vec<String> {
    let referrers: Vec<String> = graph
        .ids()
        .into_iter()
        .filter(|id| graph.get(id).map_or(false, |r| r.points_to(target_id)))
        .collect();

    for id in &referrers {
        if let Some(record) = graph.get_mut(id) {
            record.remove_outgoing(target_id);
        }
    }
    referrers
}

/// Preorder depth-first walk from `start_id`, each node at most once
fn walk_chain(cache: &NodeCache, start_id: &str) -> Result<Vec<NodeRecord>, GraphError> {
    if !cache.contains(start_id) {
        return Err(GraphError::not_found(start_id));
    }

    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack = vec![start_id.to_string()];

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        // Dangling targets are skipped
        let Some(node) = cache.get(&id) else {
            continue;
        };
        ordered.push(node.clone());
        for next in node.outgoing().iter().rev() {
            if !visited.contains(next) {
                stack.push(next.clone());
            }
        }
    }

    Ok(ordered)
}

#[derive(Clone)]
pub struct RelationshipEngine {
    store: Arc<NodeStore>,
}

impl RelationshipEngine {
    pub fn new(store: Arc<NodeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<NodeStore> {
        &self.store
    }

    /// Add `target_id` to the outgoing set of `source_id`
    ///
    /// Checks, in order: both nodes exist, the kind pair is allowed, the
    /// link is not already present (then nothing is written), a condition
    /// has no other listener yet.
    pub fn link(&self, source_id: &str, target_id: &str) -> Result<LinkOutcome, GraphError> {
        let outcome = self.store.mutate(Warmup::Ids(&[source_id, target_id]), |staged| {
            stage_link(staged, source_id, target_id)
        })?;

        match outcome {
            LinkOutcome::Linked => info!("Linked {} -> {}", source_id, target_id),
            LinkOutcome::AlreadyLinked => debug!("{} already links to {}", source_id, target_id),
        }
        Ok(outcome)
    }

    /// Remove `target_id` from the outgoing set of `source_id`
    ///
    /// Returns `false` (and writes nothing) if the link was absent.
    pub fn unlink(&self, source_id: &str, target_id: &str) -> Result<bool, GraphError> {
        let removed = self.store.mutate(Warmup::Ids(&[source_id]), |staged| {
            stage_unlink(staged, source_id, target_id)
        })?;

        if removed {
            info!("Unlinked {} -> {}", source_id, target_id);
        }
        Ok(removed)
    }

    /// Remove every reference to `target_id`; returns the ids that changed
    pub fn purge_references_to(&self, target_id: &str) -> Result<Vec<String>, GraphError> {
        let changed = self.store.mutate(Warmup::All, |staged| {
            Ok(purge_staged_references(staged, target_id))
        })?;

        if !changed.is_empty() {
            info!(
                "Purged references to {} from {} node(s)",
                target_id,
                changed.len()
            );
        }
        Ok(changed)
    }

    /// Nodes whose outgoing set contains `target_id`, in store order
    pub fn referrers(&self, target_id: &str) -> Result<Vec<NodeRecord>, GraphError> {
        self.store.read_warm(|cache| {
            Ok(cache
                .iter()
                .filter(|record| record.points_to(target_id))
                .cloned()
                .collect())
        })
    }

    /// Every node reachable from `start_id`, start first, depth-first preorder
    pub fn chain(&self, start_id: &str) -> Result<Vec<NodeRecord>, GraphError> {
        self.store.read_warm(|cache| walk_chain(cache, start_id))
    }

    /// A condition with its listener and that listener's events and accessories
    pub fn full_chain(&self, condition_id: &str) -> Result<FullChain, GraphError> {
        self.store.read_warm(|cache| {
            let condition = cache
                .get(condition_id)
                .ok_or_else(|| GraphError::not_found(condition_id))?;
            if condition.kind() != NodeKind::Condition {
                return Err(GraphError::wrong_kind(
                    condition_id,
                    NodeKind::Condition,
                    condition.kind(),
                ));
            }

            let listeners = condition
                .outgoing()
                .iter()
                .filter_map(|id| cache.get(id))
                .filter(|node| node.kind() == NodeKind::Listener)
                .map(|listener| {
                    let targets: Vec<&NodeRecord> =
                        listener.outgoing().iter().filter_map(|id| cache.get(id)).collect();
                    ListenerBranch {
                        listener: listener.clone(),
                        events: of_kind(&targets, NodeKind::Event),
                        accessories: of_kind(&targets, NodeKind::Accessory),
                    }
                })
                .collect();

            Ok(FullChain {
                condition: condition.clone(),
                listeners,
            })
        })
    }
}

fn of_kind(nodes: &[&NodeRecord], kind: NodeKind) -> Vec<NodeRecord> {
    nodes
        .iter()
        .filter(|node| node.kind() == kind)
        .map(|node| (*node).clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_table() {
        assert!(connection_allowed(NodeKind::Condition, NodeKind::Listener));
        assert!(connection_allowed(NodeKind::Listener, NodeKind::Event));
        assert!(connection_allowed(NodeKind::Listener, NodeKind::Accessory));

        assert!(!connection_allowed(NodeKind::Condition, NodeKind::Event));
        assert!(!connection_allowed(NodeKind::Listener, NodeKind::Condition));
        assert!(!connection_allowed(NodeKind::Listener, NodeKind::Listener));
        assert!(!connection_allowed(NodeKind::Event, NodeKind::Listener));
        assert!(!connection_allowed(NodeKind::Accessory, NodeKind::Event));
    }

    #[test]
    fn test_terminal_kinds_have_no_allowed_targets() {
        for source in NodeKind::ALL.iter().filter(|k| k.is_terminal()) {
            for target in NodeKind::ALL {
                assert!(!connection_allowed(*source, target));
            }
        }
    }
}
