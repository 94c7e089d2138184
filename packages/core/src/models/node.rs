//! Node Record Data Structures
//!
//! This module defines the `NodeRecord`, the atomic typed unit of a rule graph,
//! together with its kind and durable document form.
//!
//! # Architecture
//!
//! - **Typed Payload**: The record's kind is the variant of its [`NodePayload`],
//!   so kind and payload can never disagree
//! - **Forward Adjacency Only**: `outgoing` is the only relationship storage;
//!   inbound references are discovered by scanning
//! - **Flat Durable Form**: [`NodeDocument`] is the persisted/exchanged shape
//!   (`id`, `kind`, flat scalar `payload`, `outgoing`)
//!
//! # Examples
//!
//! ```rust
//! use rulegraph_core::models::{NodeKind, NodePayload, NodeRecord};
//!
//! let condition = NodeRecord::new(NodePayload::empty(NodeKind::Condition));
//! assert_eq!(condition.kind(), NodeKind::Condition);
//! assert!(condition.outgoing().is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::payload::{Layout, NodePayload, PayloadMap, Position};

/// Validation errors for node records and their payloads
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node kind: {0}")]
    InvalidNodeType(String),

    #[error("Invalid node ID format: {0}")]
    InvalidId(String),

    #[error("Payload validation failed: {0}")]
    InvalidProperties(String),

    #[error("Node {0} cannot reference itself")]
    SelfReference(String),

    #[error("Node {node_id} references {target_id} more than once")]
    DuplicateReference { node_id: String, target_id: String },

    #[error("Node ID appears more than once: {0}")]
    DuplicateNode(String),

    #[error("Outgoing references violate the {kind} shape of node {node_id}")]
    InvalidOutgoing { node_id: String, kind: NodeKind },
}

/// Classification of a node in the Condition → Listener → Event chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeKind {
    /// Circumstance under which a listener's detection counts (time, zone, weather)
    Condition,
    /// Detection target the vision layer watches for
    Listener,
    /// Action taken when a listener fires (notification, recording)
    Event,
    /// Smart-home device driven by a listener
    Accessory,
}

impl NodeKind {
    /// All recognised kinds, in chain order
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Condition,
        NodeKind::Listener,
        NodeKind::Event,
        NodeKind::Accessory,
    ];

    /// Canonical (capitalised) name used in durable records
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Condition => "Condition",
            NodeKind::Listener => "Listener",
            NodeKind::Event => "Event",
            NodeKind::Accessory => "Accessory",
        }
    }

    /// Whether nodes of this kind can never have outgoing references
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::Event | NodeKind::Accessory)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "condition" => Ok(NodeKind::Condition),
            "listener" => Ok(NodeKind::Listener),
            "event" => Ok(NodeKind::Event),
            "accessory" => Ok(NodeKind::Accessory),
            _ => Err(ValidationError::InvalidNodeType(s.to_string())),
        }
    }
}

impl TryFrom<String> for NodeKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Check that an id is usable as a record key and file name
///
/// Ids must be non-empty and made of ASCII alphanumerics, `-` and `_`.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::MissingField("id".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Generate a fresh node id
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Persisted and exchanged form of a node record
///
/// `kind` is kept as a string so unknown kinds surface as a typed error
/// instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default)]
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub payload: PayloadMap,
    #[serde(default)]
    pub outgoing: Vec<String>,
}

/// The atomic typed unit of the rule graph
///
/// Fields are private: the id and kind are fixed at construction, and the
/// outgoing set is only changed by the relationship engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeDocument", into = "NodeDocument")]
pub struct NodeRecord {
    id: String,
    payload: NodePayload,
    outgoing: Vec<String>,
}

impl NodeRecord {
    /// Create a record with a generated id and empty outgoing set
    pub fn new(payload: NodePayload) -> Self {
        Self {
            id: generate_id(),
            payload,
            outgoing: Vec::new(),
        }
    }

    /// Create a record with an explicit id (reconstruction, editor-assigned ids)
    pub fn with_id(id: impl Into<String>, payload: NodePayload) -> Result<Self, ValidationError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            id,
            payload,
            outgoing: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn outgoing(&self) -> &[String] {
        &self.outgoing
    }

    pub fn layout(&self) -> &Layout {
        self.payload.layout()
    }

    pub fn position(&self) -> Option<Position> {
        self.payload.layout().position
    }

    pub fn description(&self) -> Option<&str> {
        self.payload.layout().description.as_deref()
    }

    /// Whether this node's outgoing set contains `target_id`
    pub fn points_to(&self, target_id: &str) -> bool {
        self.outgoing.iter().any(|id| id == target_id)
    }

    /// Append a target; returns false if it was already present
    pub(crate) fn push_outgoing(&mut self, target_id: &str) -> bool {
        if self.points_to(target_id) {
            return false;
        }
        self.outgoing.push(target_id.to_string());
        true
    }

    /// Remove a target; returns false if it was absent
    pub(crate) fn remove_outgoing(&mut self, target_id: &str) -> bool {
        let before = self.outgoing.len();
        self.outgoing.retain(|id| id != target_id);
        before != self.outgoing.len()
    }

    pub(crate) fn clear_outgoing(&mut self) {
        self.outgoing.clear();
    }

    /// Replace the payload. Callers must have checked that the kind matches.
    pub(crate) fn set_payload(&mut self, payload: NodePayload) {
        debug_assert_eq!(payload.kind(), self.kind());
        self.payload = payload;
    }

    /// Validate the shape of this record in isolation
    ///
    /// Checks the id, self references, duplicate targets and the per-kind
    /// outgoing cardinality. Whether targets exist and have the right kind
    /// depends on the rest of the graph and is checked by the relationship
    /// engine.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id(&self.id)?;

        for (index, target) in self.outgoing.iter().enumerate() {
            if target == &self.id {
                return Err(ValidationError::SelfReference(self.id.clone()));
            }
            if self.outgoing[..index].contains(target) {
                return Err(ValidationError::DuplicateReference {
                    node_id: self.id.clone(),
                    target_id: target.clone(),
                });
            }
        }

        let kind = self.kind();
        let shape_ok = match kind {
            NodeKind::Condition => self.outgoing.len() <= 1,
            NodeKind::Listener => true,
            NodeKind::Event | NodeKind::Accessory => self.outgoing.is_empty(),
        };
        if !shape_ok {
            return Err(ValidationError::InvalidOutgoing {
                node_id: self.id.clone(),
                kind,
            });
        }

        Ok(())
    }

    /// Durable form of this record
    pub fn to_document(&self) -> NodeDocument {
        NodeDocument {
            id: self.id.clone(),
            kind: self.kind().as_str().to_string(),
            payload: self.payload.to_map(),
            outgoing: self.outgoing.clone(),
        }
    }
}

impl TryFrom<NodeDocument> for NodeRecord {
    type Error = ValidationError;

    fn try_from(document: NodeDocument) -> Result<Self, Self::Error> {
        let kind: NodeKind = document.kind.parse()?;
        let payload = NodePayload::from_map(kind, document.payload)?;
        let id = if document.id.is_empty() {
            generate_id()
        } else {
            document.id
        };

        let record = Self {
            id,
            payload,
            outgoing: document.outgoing,
        };
        record.validate()?;
        Ok(record)
    }
}

impl From<NodeRecord> for NodeDocument {
    fn from(record: NodeRecord) -> Self {
        NodeDocument {
            kind: record.kind().as_str().to_string(),
            payload: record.payload.to_map(),
            id: record.id,
            outgoing: record.outgoing,
        }
    }
}
