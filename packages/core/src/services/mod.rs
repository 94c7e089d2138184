//! Business Services
//!
//! This module contains the graph operations built on top of the models and
//! persistence layer:
//!
//! - `NodeStore` - Cached, lock-protected CRUD over node records
//! - `RelationshipEngine` - Typed linking rules and chain traversal
//! - `CanonicalConverter` - Store ⇄ canvas graph conversion
//! - `exchange` / `prompts` - Project import/export and detection prompts
//! - `ProjectRegistry` - Independent graphs per project directory

pub mod converter;
pub mod error;
pub mod exchange;
pub mod node_store;
pub mod project_registry;
pub mod prompts;
pub mod relationship_engine;
mod staging;

pub use converter::{CanonicalConverter, GraphMutations};
pub use error::GraphError;
pub use exchange::{
    export_document, export_listeners, export_to_path, import_document, import_from_path,
};
pub use node_store::NodeStore;
pub use project_registry::{ProjectGraph, ProjectRegistry};
pub use prompts::{build_prompt, listener_prompts};
pub use relationship_engine::{
    connection_allowed, LinkOutcome, RelationshipEngine, ALLOWED_CONNECTIONS,
};
