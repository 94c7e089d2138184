//! Canonical Converter - Store ⇄ Canvas Graph
//!
//! `to_visual` renders the store as editor nodes and edges, grouped by
//! listener neighborhood. `from_visual` applies an edited canvas back to the
//! store through the relationship rules, all-or-nothing.
//!
//! # Conversion Rules
//!
//! - A visual node keeps its canonical id in both directions
//! - Nodes absent from the canvas are left untouched
//! - The outgoing set of every node present on the canvas is replaced by the
//!   canvas edges leaving it
//! - Any rejected edge aborts the whole conversion before anything is written

use std::collections::{HashMap, HashSet};

use tracing::info;

use super::error::GraphError;
use super::node_store::Warmup;
use super::relationship_engine::{stage_link, LinkOutcome, RelationshipEngine};
use super::staging::NodeCache;
use crate::config::LayoutConfig;
use crate::models::{
    validate_id, NodeKind, NodePayload, NodeRecord, Position, ValidationError, VisualEdge,
    VisualGraph, VisualNode, KEY_DESCRIPTION, KEY_POSITION_X, KEY_POSITION_Y,
};
use serde::Serialize;

/// Ids touched by a `from_visual` application
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMutations {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Edge ids that produced a link (including ones that already existed)
    pub linked: Vec<String>,
}

#[derive(Clone)]
pub struct CanonicalConverter {
    engine: RelationshipEngine,
    layout: LayoutConfig,
}

impl CanonicalConverter {
    pub fn new(engine: RelationshipEngine, layout: LayoutConfig) -> Self {
        Self { engine, layout }
    }

    pub fn engine(&self) -> &RelationshipEngine {
        &self.engine
    }

    /// Render the whole store as a canvas graph
    pub fn to_visual(&self) -> Result<VisualGraph, GraphError> {
        self.engine
            .store()
            .read_warm(|cache| Ok(render(cache, &self.layout)))
    }

    /// Apply an edited canvas graph to the store
    pub fn from_visual(&self, graph: &VisualGraph) -> Result<GraphMutations, GraphError> {
        let store = self.engine.store();

        let mut seen = HashSet::new();
        let mut incoming = Vec::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            validate_id(&node.id)?;
            if !seen.insert(node.id.as_str()) {
                return Err(ValidationError::DuplicateNode(node.id.clone()).into());
            }
            store.ensure_kind_enabled(node.kind)?;
            incoming.push((node.id.as_str(), visual_payload(node)?));
        }

        let mutations = store.mutate(Warmup::All, |staged| {
            let mut mutations = GraphMutations::default();

            for (id, payload) in incoming {
                let existing_kind = staged.get(id).map(|record| record.kind());
                match existing_kind {
                    Some(kind) if kind != payload.kind() => {
                        return Err(GraphError::wrong_kind(id, kind, payload.kind()));
                    }
                    Some(_) => {
                        if let Some(record) = staged.get_mut(id) {
                            record.set_payload(payload);
                            record.clear_outgoing();
                        }
                        mutations.updated.push(id.to_string());
                    }
                    None => {
                        staged.insert(NodeRecord::with_id(id, payload)?);
                        mutations.created.push(id.to_string());
                    }
                }
            }

            let mut applied = HashSet::new();
            for edge in &graph.edges {
                let edge_id = edge.label();
                // Repeated edges collapse onto the first
                if !applied.insert((edge.source.as_str(), edge.target.as_str())) {
                    continue;
                }
                match stage_link(staged, &edge.source, &edge.target) {
                    Ok(LinkOutcome::Linked) | Ok(LinkOutcome::AlreadyLinked) => {
                        mutations.linked.push(edge_id)
                    }
                    Err(reason) => {
                        return Err(GraphError::edge_rejected(
                            edge_id,
                            edge.source.clone(),
                            edge.target.clone(),
                            reason,
                        ))
                    }
                }
            }

            Ok(mutations)
        })?;

        info!(
            "Applied canvas graph: {} created, {} updated, {} linked",
            mutations.created.len(),
            mutations.updated.len(),
            mutations.linked.len()
        );
        Ok(mutations)
    }
}

/// Build a payload from a canvas node's data, position and description
fn visual_payload(node: &VisualNode) -> Result<NodePayload, GraphError> {
    let mut data = node.data.clone();
    if let Some(position) = node.position {
        data.insert(KEY_POSITION_X.to_string(), position.x.into());
        data.insert(KEY_POSITION_Y.to_string(), position.y.into());
    }
    if let Some(description) = &node.description {
        data.insert(KEY_DESCRIPTION.to_string(), description.clone().into());
    }
    Ok(NodePayload::from_map(node.kind, data)?)
}

/// Column of the default layout grid for each kind
fn layout_column(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Condition => 0,
        NodeKind::Listener => 1,
        NodeKind::Event | NodeKind::Accessory => 2,
    }
}

/// Collects canvas nodes and edges without duplicates
struct CanvasBuilder<'a> {
    layout: &'a LayoutConfig,
    graph: VisualGraph,
    nodes_seen: HashSet<String>,
    edges_seen: HashSet<(String, String)>,
    rows: HashMap<usize, usize>,
}

impl<'a> CanvasBuilder<'a> {
    fn new(layout: &'a LayoutConfig) -> Self {
        Self {
            layout,
            graph: VisualGraph::default(),
            nodes_seen: HashSet::new(),
            edges_seen: HashSet::new(),
            rows: HashMap::new(),
        }
    }

    fn add_node(&mut self, record: &NodeRecord) {
        if !self.nodes_seen.insert(record.id().to_string()) {
            return;
        }

        let column = layout_column(record.kind());
        let row = self.rows.entry(column).or_insert(0);
        let fallback = Position::new(
            self.layout.origin_x + column as f64 * self.layout.column_spacing,
            self.layout.origin_y + *row as f64 * self.layout.row_spacing,
        );
        *row += 1;

        self.graph.nodes.push(VisualNode {
            id: record.id().to_string(),
            kind: record.kind(),
            position: Some(record.position().unwrap_or(fallback)),
            description: record.description().map(str::to_string),
            data: record.payload().data_map(),
        });
    }

    fn add_edge(&mut self, source: &str, target: &str) {
        if self
            .edges_seen
            .insert((source.to_string(), target.to_string()))
        {
            self.graph.edges.push(VisualEdge::new(source, target));
        }
    }

    fn finish(self) -> VisualGraph {
        self.graph
    }
}

/// Lay out every listener neighborhood in store order
fn render(cache: &NodeCache, layout: &LayoutConfig) -> VisualGraph {
    let mut canvas = CanvasBuilder::new(layout);

    for listener in cache.iter().filter(|n| n.kind() == NodeKind::Listener) {
        let conditions: Vec<&NodeRecord> = cache
            .iter()
            .filter(|n| n.kind() == NodeKind::Condition && n.points_to(listener.id()))
            .collect();
        let targets: Vec<&NodeRecord> = listener
            .outgoing()
            .iter()
            .filter_map(|id| cache.get(id))
            .collect();

        for condition in &conditions {
            canvas.add_node(condition);
        }
        canvas.add_node(listener);
        for target in &targets {
            canvas.add_node(target);
        }

        for condition in &conditions {
            canvas.add_edge(condition.id(), listener.id());
        }
        for target in &targets {
            canvas.add_edge(listener.id(), target.id());
        }
    }

    canvas.finish()
}
