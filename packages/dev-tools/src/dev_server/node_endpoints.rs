//! Node and relationship endpoints for the HTTP dev server
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/options` - Editor `type` catalogs per enabled kind
//! - `GET /api/projects` - List known projects
//! - `GET /api/projects/:project/nodes?kind=` - List nodes, optionally by kind
//! - `POST /api/projects/:project/nodes` - Create a node
//! - `GET /api/projects/:project/nodes/:id` - Get a node by ID
//! - `DELETE /api/projects/:project/nodes/:id` - Delete a node and purge references
//! - `POST /api/projects/:project/links` - Link two nodes
//! - `DELETE /api/projects/:project/links` - Unlink two nodes
//! - `GET /api/projects/:project/nodes/:id/chain` - Reachable nodes from a start node
//! - `GET /api/projects/:project/nodes/:id/full-chain` - Structured chain from a condition
//! - `GET /api/projects/:project/nodes/:id/referrers` - Nodes pointing at a node

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dev_server::{run_blocking, AppState, HttpError};
use rulegraph_core::models::{FullChain, NodeKind, NodeRecord, PayloadMap};
use rulegraph_core::services::{GraphError, LinkOutcome};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct ListNodesQuery {
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNodeInput {
    pub kind: String,
    #[serde(default)]
    pub payload: PayloadMap,
}

/// Source and target of a relationship request
#[derive(Debug, Deserialize)]
pub struct LinkInput {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub linked: bool,
    pub already_linked: bool,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

/// Returns server status and version information
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn kind_options(
    State(state): State<AppState>,
) -> Json<BTreeMap<&'static str, &'static [&'static str]>> {
    let accessories = state.registry.config().accessories_enabled;
    let options = NodeKind::ALL
        .into_iter()
        .filter(|kind| accessories || *kind != NodeKind::Accessory)
        .map(|kind| (kind.as_str(), kind.options()))
        .collect();
    Json(options)
}

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<String>>, HttpError> {
    let registry = state.registry.clone();
    Ok(Json(run_blocking(move || registry.list()).await?))
}

async fn list_nodes(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<ListNodesQuery>,
) -> Result<Json<Vec<NodeRecord>>, HttpError> {
    let project = state.existing_project(project_id).await?;
    let nodes = run_blocking(move || {
        let kind = match query.kind {
            Some(kind) => Some(kind.parse::<NodeKind>().map_err(GraphError::from)?),
            None => None,
        };
        project.store().list(kind)
    })
    .await?;
    Ok(Json(nodes))
}

/// Create a node
///
/// ```bash
/// curl -X POST http://localhost:3001/api/projects/demo/nodes \
///   -H "Content-Type: application/json" \
///   -d '{"kind": "Listener", "payload": {"name": "person", "type": "object"}}'
/// ```
async fn create_node(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<CreateNodeInput>,
) -> Result<Json<String>, HttpError> {
    let project = state.project(project_id).await?;
    let id = run_blocking(move || {
        let kind = input.kind.parse::<NodeKind>().map_err(GraphError::from)?;
        project.store().create(kind, input.payload)
    })
    .await?;

    tracing::debug!("Created node: {}", id);
    Ok(Json(id))
}

async fn get_node(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<Json<NodeRecord>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.store().get(&id)).await?))
}

async fn delete_node(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<Json<RemovedResponse>, HttpError> {
    let project = state.existing_project(project_id).await?;
    let removed = run_blocking(move || project.store().delete(&id)).await?;
    Ok(Json(RemovedResponse { removed }))
}

async fn link_nodes(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<LinkInput>,
) -> Result<Json<LinkResponse>, HttpError> {
    let project = state.existing_project(project_id).await?;
    let outcome = run_blocking(move || project.engine().link(&input.source, &input.target)).await?;
    Ok(Json(LinkResponse {
        linked: true,
        already_linked: outcome == LinkOutcome::AlreadyLinked,
    }))
}

async fn unlink_nodes(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<LinkInput>,
) -> Result<Json<RemovedResponse>, HttpError> {
    let project = state.existing_project(project_id).await?;
    let removed = run_blocking(move || project.engine().unlink(&input.source, &input.target)).await?;
    Ok(Json(RemovedResponse { removed }))
}

async fn get_chain(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<Json<Vec<NodeRecord>>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.engine().chain(&id)).await?))
}

async fn get_full_chain(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<Json<FullChain>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.engine().full_chain(&id)).await?))
}

async fn get_referrers(
    State(state): State<AppState>,
    Path((project_id, id)): Path<(String, String)>,
) -> Result<Json<Vec<NodeRecord>>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.engine().referrers(&id)).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/options", get(kind_options))
        .route("/api/projects", get(list_projects))
        .route(
            "/api/projects/:project/nodes",
            get(list_nodes).post(create_node),
        )
        .route(
            "/api/projects/:project/nodes/:id",
            get(get_node).delete(delete_node),
        )
        .route(
            "/api/projects/:project/links",
            post(link_nodes).delete(unlink_nodes),
        )
        .route("/api/projects/:project/nodes/:id/chain", get(get_chain))
        .route("/api/projects/:project/nodes/:id/full-chain", get(get_full_chain))
        .route("/api/projects/:project/nodes/:id/referrers", get(get_referrers))
        .with_state(state)
}
