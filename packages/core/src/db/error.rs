//! Persistence Error Types
//!
//! This module defines error types for the durable storage layer, covering
//! filesystem failures, (de)serialization and retry exhaustion.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Durable storage errors
///
/// Graph-level failures (unknown nodes, illegal links) are handled by the
/// service-layer error type.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem operation failed
    #[error("I/O failure at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("Failed to serialize node {id}: {source}")]
    Serialization {
        id: String,
        source: serde_json::Error,
    },

    /// Stored file is unreadable or does not describe a valid record
    #[error("Corrupt record at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Retries ran past the configured time budget
    #[error("Persisting node {id} timed out after {attempts} attempt(s) in {elapsed:?}")]
    TimedOut {
        id: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// Backend cannot be used (poisoned lock, injected failure, ...)
    #[error("Persistence backend unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Create an I/O error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt-record error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unavailable-backend error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
