//! HTTP error handling for dev server
//!
//! Every graph failure is reported as `{message, code, details?}` where
//! `code` is the stable code from [`GraphError::code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rulegraph_core::services::GraphError;
use serde::{Deserialize, Serialize};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" | "PROJECT_NOT_FOUND" => StatusCode::NOT_FOUND,
            "INVALID_KIND" | "VALIDATION_ERROR" | "INVALID_DOCUMENT" => StatusCode::BAD_REQUEST,
            "ILLEGAL_CONNECTION" | "CONDITION_ALREADY_LINKED" | "WRONG_KIND" | "EDGE_REJECTED" => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<GraphError> for HttpError {
    fn from(err: GraphError) -> Self {
        match &err {
            // Surface the failing edge's underlying reason for the editor
            GraphError::EdgeRejected { reason, .. } => HttpError::with_details(
                err.to_string(),
                err.code(),
                format!("{}: {}", reason.code(), reason),
            ),
            GraphError::PersistenceFailure(_) | GraphError::LockPoisoned(_) => {
                tracing::error!("Graph operation failed: {:?}", err);
                HttpError::with_details(err.to_string(), err.code(), format!("{:?}", err))
            }
            _ => HttpError::new(err.to_string(), err.code()),
        }
    }
}
