//! Import and export of whole projects
//!
//! Two export shapes are produced:
//!
//! - A flat [`ExportDocument`] (every record verbatim) that can be imported
//!   back into any project
//! - A listener-centric [`ListenerExport`] consumed by the detection pipeline

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};

use super::error::GraphError;
use super::node_store::{NodeStore, Warmup};
use super::relationship_engine::stage_link;
use crate::db::PersistenceError;
use crate::models::{
    generate_id, validate_id, AccessoryEntry, ConditionEntry, EventEntry, ExportDocument,
    ImportSummary, ListenerEntry, ListenerExport, NodeKind, NodePayload, NodeRecord,
    ValidationError,
};

/// Snapshot every record as a flat export document
pub fn export_document(store: &NodeStore) -> Result<ExportDocument, GraphError> {
    let nodes = store
        .list(None)?
        .iter()
        .map(NodeRecord::to_document)
        .collect();

    Ok(ExportDocument {
        nodes,
        exported_at: Some(Utc::now()),
    })
}

/// Import a flat export document into the store
///
/// Every record is parsed and validated before anything is written. Ids
/// that already exist in the store are remapped to fresh ids (references
/// inside the document follow the remap); other ids are kept. Outgoing
/// references are applied through the link rules, so an illegal or dangling
/// reference rejects the whole import.
pub fn import_document(
    store: &NodeStore,
    document: &ExportDocument,
) -> Result<ImportSummary, GraphError> {
    struct Parsed {
        id: String,
        payload: NodePayload,
        outgoing: Vec<String>,
    }

    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(document.nodes.len());
    for node in &document.nodes {
        let kind: NodeKind = node.kind.parse()?;
        store.ensure_kind_enabled(kind)?;

        let id = if node.id.is_empty() {
            generate_id()
        } else {
            validate_id(&node.id)?;
            node.id.clone()
        };
        if !seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateNode(id).into());
        }

        parsed.push(Parsed {
            id,
            payload: NodePayload::from_map(kind, node.payload.clone())?,
            outgoing: node.outgoing.clone(),
        });
    }

    let summary = store.mutate(Warmup::All, |staged| {
        let remapped: BTreeMap<String, String> = parsed
            .iter()
            .filter(|node| staged.contains(&node.id))
            .map(|node| (node.id.clone(), generate_id()))
            .collect();
        let resolve = |id: &str| remapped.get(id).cloned().unwrap_or_else(|| id.to_string());

        for node in &parsed {
            staged.insert(NodeRecord::with_id(resolve(&node.id), node.payload.clone())?);
        }
        for node in &parsed {
            let source = resolve(&node.id);
            for target in &node.outgoing {
                stage_link(staged, &source, &resolve(target))?;
            }
        }

        Ok(ImportSummary {
            imported: parsed.len(),
            remapped: remapped.clone(),
        })
    })?;

    if !summary.remapped.is_empty() {
        warn!(
            "Import remapped {} colliding node id(s)",
            summary.remapped.len()
        );
    }
    info!("Imported {} node(s)", summary.imported);
    Ok(summary)
}

/// Write a flat export document to `path`
pub fn export_to_path(store: &NodeStore, path: &Path) -> Result<ExportDocument, GraphError> {
    let document = export_document(store)?;
    let contents = serde_json::to_string_pretty(&document)
        .map_err(|e| GraphError::invalid_document(e.to_string()))?;
    fs::write(path, contents).map_err(|e| PersistenceError::io(path, e))?;
    info!("Exported {} node(s) to {:?}", document.nodes.len(), path);
    Ok(document)
}

/// Read a flat export document from `path` and import it
pub fn import_from_path(store: &NodeStore, path: &Path) -> Result<ImportSummary, GraphError> {
    let contents = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
    let document: ExportDocument = serde_json::from_str(&contents)
        .map_err(|e| GraphError::invalid_document(format!("{:?}: {}", path, e)))?;
    import_document(store, &document)
}

/// Group the store around its listeners
///
/// Each listener lists the conditions pointing at it and the events and
/// accessories it points at.
pub fn export_listeners(store: &NodeStore) -> Result<ListenerExport, GraphError> {
    let records = store.list(None)?;
    let lookup: BTreeMap<&str, &NodeRecord> = records.iter().map(|r| (r.id(), r)).collect();

    let listeners: Vec<ListenerEntry> = records
        .iter()
        .filter(|r| r.kind() == NodeKind::Listener)
        .map(|listener| {
            let conditions = records
                .iter()
                .filter(|r| r.kind() == NodeKind::Condition && r.points_to(listener.id()))
                .map(|c| ConditionEntry {
                    condition_id: c.id().to_string(),
                    condition_data: c.payload().to_map(),
                })
                .collect();

            let targets: Vec<&NodeRecord> = listener
                .outgoing()
                .iter()
                .filter_map(|id| lookup.get(id.as_str()).copied())
                .collect();
            let events = targets
                .iter()
                .filter(|t| t.kind() == NodeKind::Event)
                .map(|e| EventEntry {
                    event_id: e.id().to_string(),
                    event_data: e.payload().to_map(),
                })
                .collect();
            let accessories = targets
                .iter()
                .filter(|t| t.kind() == NodeKind::Accessory)
                .map(|a| AccessoryEntry {
                    accessory_id: a.id().to_string(),
                    accessory_data: a.payload().to_map(),
                })
                .collect();

            ListenerEntry {
                listener_id: listener.id().to_string(),
                listener_data: listener.payload().to_map(),
                conditions,
                events,
                accessories,
            }
        })
        .collect();

    Ok(ListenerExport {
        total_listeners: listeners.len(),
        listeners,
    })
}
