//! Data Models
//!
//! This module contains the core data structures of a rule graph:
//!
//! - `NodeRecord` - Typed node with forward-only `outgoing` references
//! - `NodePayload` - Per-kind payload variants over a flat scalar map
//! - `VisualGraph` - Canvas nodes and edges exchanged with the editor
//! - Chain and export read models

mod chain;
mod node;
mod options;
mod payload;
mod visual;

#[cfg(test)]
mod payload_test;

pub use chain::{
    AccessoryEntry, ConditionEntry, EventEntry, ExportDocument, FullChain, ImportSummary,
    ListenerBranch, ListenerEntry, ListenerExport, ListenerPrompt,
};
pub use node::{generate_id, validate_id, NodeDocument, NodeKind, NodeRecord, ValidationError};
pub use payload::{
    AccessoryPayload, ConditionPayload, EventPayload, Layout, ListenerPayload, NodePayload,
    PayloadMap, Position, KEY_ACTION, KEY_DESCRIPTION, KEY_MESSAGE, KEY_NAME, KEY_POSITION_X,
    KEY_POSITION_Y, KEY_RECIPIENT, KEY_THRESHOLD, KEY_TYPE, LAYOUT_KEYS,
};
pub use visual::{edge_id, VisualEdge, VisualGraph, VisualNode};
