//! Service Layer Error Types
//!
//! This module defines the error type returned by every graph operation:
//! store access, linking, conversion and import/export.

use crate::db::PersistenceError;
use crate::models::{NodeKind, ValidationError};
use thiserror::Error;

/// Graph operation errors
///
/// Each variant has a stable machine-readable [`code`](GraphError::code) so
/// callers (HTTP handlers, the editor) can branch without matching on text.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// Project not opened and not present on disk
    #[error("Project not found: {project_id}")]
    ProjectNotFound { project_id: String },

    /// Unknown or disabled node kind
    #[error("Invalid node kind: {0}")]
    InvalidKind(String),

    /// Source → target pair is not an allowed connection
    #[error("Cannot connect {source_kind} {source_id} to {target_kind} {target_id}")]
    IllegalConnection {
        source_id: String,
        source_kind: NodeKind,
        target_id: String,
        target_kind: NodeKind,
    },

    /// Condition already drives a listener
    #[error("Condition {condition_id} is already linked to listener {listener_id}")]
    ConditionAlreadyLinked {
        condition_id: String,
        listener_id: String,
    },

    /// Operation requires a node of a different kind
    #[error("Node {id} is a {actual}, expected {expected}")]
    WrongKind {
        id: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// Save requested for a node that is not cached
    #[error("Node {id} is not in the cache")]
    NotCached { id: String },

    /// Durable write or read failed
    #[error("Persistence failed: {0}")]
    PersistenceFailure(#[from] PersistenceError),

    /// Record or payload validation failed
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// A canvas edge could not be applied
    #[error("Edge {edge_id} ({source_id} -> {target_id}) rejected: {reason}")]
    EdgeRejected {
        edge_id: String,
        source_id: String,
        target_id: String,
        #[source]
        reason: Box<GraphError>,
    },

    /// Import/export document could not be read or parsed
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A lock was poisoned by a panicking writer
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<ValidationError> for GraphError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidNodeType(kind) => GraphError::InvalidKind(kind),
            other => GraphError::Validation(other),
        }
    }
}

impl GraphError {
    /// Create a node not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a project not found error
    pub fn project_not_found(project_id: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project_id: project_id.into(),
        }
    }

    /// Create an invalid kind error
    pub fn invalid_kind(kind: impl Into<String>) -> Self {
        Self::InvalidKind(kind.into())
    }

    /// Create a wrong kind error
    pub fn wrong_kind(id: impl Into<String>, expected: NodeKind, actual: NodeKind) -> Self {
        Self::WrongKind {
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Create a not cached error
    pub fn not_cached(id: impl Into<String>) -> Self {
        Self::NotCached { id: id.into() }
    }

    /// Wrap the reason an editor edge could not be applied
    pub fn edge_rejected(
        edge_id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        reason: GraphError,
    ) -> Self {
        Self::EdgeRejected {
            edge_id: edge_id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            reason: Box::new(reason),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a lock poisoned error
    pub fn lock_poisoned(what: impl Into<String>) -> Self {
        Self::LockPoisoned(what.into())
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::NotFound { .. } => "NODE_NOT_FOUND",
            GraphError::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            GraphError::InvalidKind(_) => "INVALID_KIND",
            GraphError::IllegalConnection { .. } => "ILLEGAL_CONNECTION",
            GraphError::ConditionAlreadyLinked { .. } => "CONDITION_ALREADY_LINKED",
            GraphError::WrongKind { .. } => "WRONG_KIND",
            GraphError::NotCached { .. } => "NOT_CACHED",
            GraphError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            GraphError::Validation(_) => "VALIDATION_ERROR",
            GraphError::EdgeRejected { .. } => "EDGE_REJECTED",
            GraphError::InvalidDocument(_) => "INVALID_DOCUMENT",
            GraphError::Configuration(_) => "CONFIGURATION_ERROR",
            GraphError::LockPoisoned(_) => "LOCK_POISONED",
        }
    }

    /// The innermost cause for wrapped edge errors
    pub fn root_cause(&self) -> &GraphError {
        match self {
            GraphError::EdgeRejected { reason, .. } => reason.root_cause(),
            other => other,
        }
    }
}
