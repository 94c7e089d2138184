//! Canvas and exchange endpoints for the HTTP dev server
//!
//! # Endpoints
//!
//! - `GET /api/projects/:project/graph` - Render the project as a canvas graph
//! - `PUT /api/projects/:project/graph` - Apply an edited canvas graph
//! - `GET /api/projects/:project/export` - Flat export document
//! - `POST /api/projects/:project/import` - Import an export document
//! - `GET /api/projects/:project/listeners` - Listener-centric export
//! - `GET /api/projects/:project/prompts` - Detection prompt per listener

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};

use crate::dev_server::{run_blocking, AppState, HttpError};
use rulegraph_core::models::{
    ExportDocument, ImportSummary, ListenerExport, ListenerPrompt, VisualGraph,
};
use rulegraph_core::services::GraphMutations;

async fn get_graph(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<VisualGraph>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.to_visual()).await?))
}

/// Apply an edited canvas
///
/// The whole canvas is rejected when any edge is illegal; the response
/// then carries `EDGE_REJECTED` with the failing edge in `message`.
async fn put_graph(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(graph): Json<VisualGraph>,
) -> Result<Json<GraphMutations>, HttpError> {
    let project = state.project(project_id).await?;
    let mutations = run_blocking(move || project.from_visual(&graph)).await?;

    tracing::debug!(
        "Applied canvas: {} created, {} updated, {} edges",
        mutations.created.len(),
        mutations.updated.len(),
        mutations.linked.len()
    );
    Ok(Json(mutations))
}

async fn export_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ExportDocument>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.export()).await?))
}

async fn import_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(document): Json<ExportDocument>,
) -> Result<Json<ImportSummary>, HttpError> {
    let project = state.project(project_id).await?;
    Ok(Json(run_blocking(move || project.import(&document)).await?))
}

async fn export_listeners(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ListenerExport>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.export_listeners()).await?))
}

async fn listener_prompts(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<ListenerPrompt>>, HttpError> {
    let project = state.existing_project(project_id).await?;
    Ok(Json(run_blocking(move || project.listener_prompts()).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/projects/:project/graph", get(get_graph).put(put_graph))
        .route("/api/projects/:project/export", get(export_project))
        .route("/api/projects/:project/import", post(import_project))
        .route("/api/projects/:project/listeners", get(export_listeners))
        .route("/api/projects/:project/prompts", get(listener_prompts))
        .with_state(state)
}
