//! Project Registry
//!
//! A project is one independent rule graph stored under
//! `<data_dir>/<project_id>/nodes/`. The registry opens projects on demand
//! and hands out shared [`ProjectGraph`] handles.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::converter::{CanonicalConverter, GraphMutations};
use super::error::GraphError;
use super::exchange;
use super::node_store::NodeStore;
use super::prompts;
use super::relationship_engine::RelationshipEngine;
use crate::config::{GraphConfig, LayoutConfig};
use crate::db::PersistenceError;
use crate::models::{
    validate_id, ExportDocument, ImportSummary, ListenerExport, ListenerPrompt, VisualGraph,
};

const NODES_DIR: &str = "nodes";

/// Store, engine and converter of a single project
pub struct ProjectGraph {
    project_id: String,
    store: Arc<NodeStore>,
    engine: RelationshipEngine,
    converter: CanonicalConverter,
}

impl ProjectGraph {
    pub fn new(project_id: impl Into<String>, store: Arc<NodeStore>, layout: LayoutConfig) -> Self {
        let engine = RelationshipEngine::new(store.clone());
        let converter = CanonicalConverter::new(engine.clone(), layout);
        Self {
            project_id: project_id.into(),
            store,
            engine,
            converter,
        }
    }

    /// Throwaway project backed by memory
    pub fn in_memory(project_id: impl Into<String>) -> Self {
        Self::new(
            project_id,
            Arc::new(NodeStore::in_memory()),
            LayoutConfig::default(),
        )
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn engine(&self) -> &RelationshipEngine {
        &self.engine
    }

    pub fn converter(&self) -> &CanonicalConverter {
        &self.converter
    }

    pub fn to_visual(&self) -> Result<VisualGraph, GraphError> {
        self.converter.to_visual()
    }

    pub fn from_visual(&self, graph: &VisualGraph) -> Result<GraphMutations, GraphError> {
        self.converter.from_visual(graph)
    }

    pub fn export(&self) -> Result<ExportDocument, GraphError> {
        exchange::export_document(&self.store)
    }

    pub fn import(&self, document: &ExportDocument) -> Result<ImportSummary, GraphError> {
        exchange::import_document(&self.store, document)
    }

    pub fn export_to_path(&self, path: &Path) -> Result<ExportDocument, GraphError> {
        exchange::export_to_path(&self.store, path)
    }

    pub fn import_from_path(&self, path: &Path) -> Result<ImportSummary, GraphError> {
        exchange::import_from_path(&self.store, path)
    }

    pub fn export_listeners(&self) -> Result<ListenerExport, GraphError> {
        exchange::export_listeners(&self.store)
    }

    pub fn listener_prompts(&self) -> Result<Vec<ListenerPrompt>, GraphError> {
        Ok(prompts::listener_prompts(&self.export_listeners()?))
    }
}

pub struct ProjectRegistry {
    config: GraphConfig,
    projects: RwLock<HashMap<String, Arc<ProjectGraph>>>,
}

impl ProjectRegistry {
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate().map_err(GraphError::configuration)?;
        info!("Project registry rooted at {:?}", config.data_dir);
        Ok(Self {
            config,
            projects: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn project_dir(&self, project_id: &str) -> PathBuf {
        self.config.data_dir.join(project_id)
    }

    /// Open a project, creating its directory if needed
    pub fn open(&self, project_id: &str) -> Result<Arc<ProjectGraph>, GraphError> {
        validate_id(project_id)?;

        if let Some(project) = self.read_projects()?.get(project_id) {
            return Ok(project.clone());
        }

        let mut projects = self
            .projects
            .write()
            .map_err(|_| GraphError::lock_poisoned("project registry"))?;
        if let Some(project) = projects.get(project_id) {
            return Ok(project.clone());
        }

        let nodes_dir = self.project_dir(project_id).join(NODES_DIR);
        let store = NodeStore::open_dir(&nodes_dir, &self.config)?;
        let project = Arc::new(ProjectGraph::new(
            project_id,
            Arc::new(store),
            self.config.layout.clone(),
        ));
        projects.insert(project_id.to_string(), project.clone());
        info!("Opened project {} at {:?}", project_id, nodes_dir);
        Ok(project)
    }

    /// Open a project only if it is already open or exists on disk
    pub fn existing(&self, project_id: &str) -> Result<Arc<ProjectGraph>, GraphError> {
        validate_id(project_id)?;
        let open = self.read_projects()?.contains_key(project_id);
        if !open && !self.project_dir(project_id).join(NODES_DIR).is_dir() {
            return Err(GraphError::project_not_found(project_id));
        }
        self.open(project_id)
    }

    /// Open projects and projects on disk, sorted
    pub fn list(&self) -> Result<Vec<String>, GraphError> {
        let mut ids: Vec<String> = self.read_projects()?.keys().cloned().collect();

        let data_dir = &self.config.data_dir;
        if data_dir.is_dir() {
            let entries = fs::read_dir(data_dir).map_err(|e| PersistenceError::io(data_dir, e))?;
            for entry in entries {
                let path = entry.map_err(|e| PersistenceError::io(data_dir, e))?.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if path.join(NODES_DIR).is_dir() && validate_id(name).is_ok() {
                    ids.push(name.to_string());
                }
            }
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Forget an open project; its files stay on disk
    pub fn close(&self, project_id: &str) -> Result<bool, GraphError> {
        let closed = self
            .projects
            .write()
            .map_err(|_| GraphError::lock_poisoned("project registry"))?
            .remove(project_id)
            .is_some();
        if closed {
            debug!("Closed project {}", project_id);
        }
        Ok(closed)
    }

    fn read_projects(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Arc<ProjectGraph>>>, GraphError>
    {
        self.projects
            .read()
            .map_err(|_| GraphError::lock_poisoned("project registry"))
    }
}
