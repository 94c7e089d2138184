//! RuleGraph Core Business Logic Layer
//!
//! This crate provides the typed rule graph behind a visual detection-rule
//! editor: Conditions gate Listeners, Listeners drive Events and Accessories.
//!
//! # Architecture
//!
//! - **Typed Records**: Every node carries a kind-specific payload over a flat
//!   scalar map, so layout and domain data persist together
//! - **Forward Adjacency**: Relationships live only in each node's `outgoing`
//!   list; inbound queries scan the store
//! - **All-or-Nothing Writes**: Multi-node changes are staged, persisted as a
//!   batch and only then published to the cache
//! - **File Storage**: One JSON file per node under a per-project directory
//!
//! # Modules
//!
//! - [`models`] - Data structures (NodeRecord, payloads, canvas graph)
//! - [`db`] - Persistence trait and backends
//! - [`services`] - Node store, relationship engine, converter, registry
//! - [`config`] - Runtime configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{GraphConfig, LayoutConfig, PersistenceConfig};
pub use models::*;
pub use services::*;
