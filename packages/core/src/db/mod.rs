//! Persistence Layer
//!
//! This module handles durable storage of node records:
//!
//! - `NodePersistence` trait separating the node store from its medium
//! - JSON-directory backend (one file per node, atomic replace, bounded retry)
//! - In-memory backend for tests and scratch projects
//! - Ordered batch application with compensating rollback

mod error;
mod json_dir;
mod memory;
mod persistence;

pub use error::PersistenceError;
pub use json_dir::JsonDirPersistence;
pub use memory::MemoryPersistence;
pub use persistence::{apply_batch, BatchEntry, NodePersistence, WriteOp};
