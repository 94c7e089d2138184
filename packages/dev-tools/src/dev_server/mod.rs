//! Development-only HTTP server for the canvas editor
//!
//! Exposes the project registry as a small REST API so the web canvas can
//! be developed against real project directories. Not meant for
//! production use.
//!
//! # Architecture
//!
//! Endpoints are split into modules merged by [`create_router`]:
//! - `node_endpoints`: health, kind options, node CRUD and relationships
//! - `graph_endpoints`: canvas conversion, export/import and listener prompts
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rulegraph-dev-tools --bin dev-server
//! ```
//!
//! # Security
//!
//! - CORS restricted to localhost origins
//! - No authentication (local development only)

use axum::{
    http::{header, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use rulegraph_core::services::{GraphError, ProjectGraph, ProjectRegistry};

mod graph_endpoints;
mod http_error;
mod node_endpoints;

pub use http_error::HttpError;

/// Application state shared across all endpoints
///
/// The registry serializes writes per project through each store's own
/// write lock, so no request-level lock is held here.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProjectRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<ProjectRegistry>) -> Self {
        Self { registry }
    }

    /// Open (creating on first use) the named project on a blocking worker
    pub(crate) async fn project(&self, project_id: String) -> Result<Arc<ProjectGraph>, HttpError> {
        let registry = self.registry.clone();
        run_blocking(move || registry.open(&project_id)).await
    }

    /// Resolve a project that must already exist
    pub(crate) async fn existing_project(
        &self,
        project_id: String,
    ) -> Result<Arc<ProjectGraph>, HttpError> {
        let registry = self.registry.clone();
        run_blocking(move || registry.existing(&project_id)).await
    }
}

/// Run a synchronous graph operation off the async runtime
///
/// Store operations touch the filesystem and hold std locks, so they run
/// on tokio's blocking pool.
pub(crate) async fn run_blocking<T, F>(operation: F) -> Result<T, HttpError>
where
    F: FnOnce() -> Result<T, GraphError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| HttpError::new(format!("Worker task failed: {}", e), "INTERNAL_ERROR"))?
        .map_err(HttpError::from)
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(node_endpoints::routes(state.clone()))
        .merge(graph_endpoints::routes(state))
        .layer(cors_layer())
}

/// Create CORS layer for development
///
/// Defaults cover the usual Vite ports. Set CORS_ALLOW_ORIGIN to allow a
/// different origin instead.
fn cors_layer() -> CorsLayer {
    let default_origins = [
        "http://localhost:1420",
        "http://localhost:5173", // Vite default
        "http://localhost:1421",
    ];

    let configured: Vec<String> = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(custom_origin) => vec![custom_origin],
        Err(_) => default_origins.iter().map(|o| o.to_string()).collect(),
    };

    let origins: Vec<header::HeaderValue> = configured
        .iter()
        .filter_map(|origin| match origin.parse::<header::HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Start the HTTP dev server
///
/// # Errors
///
/// Returns error if the server fails to bind or stops unexpectedly.
pub async fn start_server(registry: Arc<ProjectRegistry>, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(registry));

    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("HTTP dev server starting on http://{}", addr);
    tracing::info!("Development mode only - NOT for production use");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rulegraph_core::config::GraphConfig;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let registry = ProjectRegistry::new(GraphConfig::with_data_dir(temp_dir.path())).unwrap();
        (create_router(AppState::new(Arc::new(registry))), temp_dir)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, kind: &str, payload: Value) -> String {
        let (status, body) = send(
            router,
            Method::POST,
            "/api/projects/demo/nodes",
            Some(json!({"kind": kind, "payload": payload})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body.as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (router, _temp_dir) = test_router();
        let (status, body) = send(&router, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_link_and_render_canvas() {
        let (router, _temp_dir) = test_router();
        let condition = create(&router, "Condition", json!({"name": "night"})).await;
        let listener = create(&router, "Listener", json!({"name": "person"})).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/projects/demo/links",
            Some(json!({"source": condition, "target": listener})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["linked"], true);

        let (status, graph) = send(&router, Method::GET, "/api/projects/demo/graph", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(graph["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(graph["edges"][0]["id"], format!("{}->{}", condition, listener));
    }

    #[tokio::test]
    async fn test_illegal_link_is_conflict() {
        let (router, _temp_dir) = test_router();
        let condition = create(&router, "Condition", json!({})).await;
        let event = create(&router, "Event", json!({})).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/projects/demo/links",
            Some(json!({"source": condition, "target": event})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ILLEGAL_CONNECTION");
    }

    #[tokio::test]
    async fn test_unknown_project_and_node() {
        let (router, _temp_dir) = test_router();
        let (status, body) = send(&router, Method::GET, "/api/projects/missing/graph", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PROJECT_NOT_FOUND");

        create(&router, "Listener", json!({})).await;
        let (status, body) = send(&router, Method::GET, "/api/projects/demo/nodes/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NODE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_kind_is_bad_request() {
        let (router, _temp_dir) = test_router();
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/projects/demo/nodes",
            Some(json!({"kind": "Trigger", "payload": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_KIND");
    }
}
