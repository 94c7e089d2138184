//! Canvas Graph Shapes
//!
//! The visual graph is what the node editor renders and sends back: nodes
//! with a type, a position and a data map, plus plain source → target edges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::node::NodeKind;
use super::payload::{PayloadMap, Position};

/// Editor-facing graph of nodes and edges
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualGraph {
    #[serde(default)]
    pub nodes: Vec<VisualNode>,
    #[serde(default)]
    pub edges: Vec<VisualEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub data: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
}

impl VisualEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
        }
    }

    /// Edge id, derived from the endpoints when the editor left it blank
    pub fn label(&self) -> String {
        if self.id.is_empty() {
            edge_id(&self.source, &self.target)
        } else {
            self.id.clone()
        }
    }
}

/// Stable edge id for a source → target pair
pub fn edge_id(source: &str, target: &str) -> String {
    format!("{}->{}", source, target)
}

impl VisualGraph {
    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges as a set of (source, target) pairs, ignoring edge ids and order
    pub fn edge_pairs(&self) -> BTreeSet<(String, String)> {
        self.edges
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect()
    }

    pub fn node_ids(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }
}
