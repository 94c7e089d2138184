//! Integration tests for project export and import
//!
//! Tests cover:
//! - Flat export → import round trip into a fresh project
//! - Id remapping on collision
//! - Validation before any write
//! - Listener-centric export and detection prompts
//! - File-based export/import

use anyhow::Result;
use rulegraph_core::{
    models::{ExportDocument, NodeKind, NodeRecord, PayloadMap},
    services::{GraphError, ProjectGraph},
};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tempfile::TempDir;

fn data(value: serde_json::Value) -> PayloadMap {
    value.as_object().cloned().unwrap_or_default()
}

/// Test helper: Build a small project
///
/// nighttime, backyard → person → {email, porch light}; car listener unlinked
fn create_sample_project() -> Result<ProjectGraph> {
    let project = ProjectGraph::in_memory("sample");
    let store = project.store();
    let engine = project.engine();

    let night = store.create(
        NodeKind::Condition,
        data(json!({"name": "nighttime", "type": "time", "threshold": 0.8})),
    )?;
    let yard = store.create(
        NodeKind::Condition,
        data(json!({"name": "backyard", "type": "zone"})),
    )?;
    let person = store.create(
        NodeKind::Listener,
        data(json!({"name": "person", "type": "object", "position.x": 320.0, "position.y": 0.0})),
    )?;
    store.create(NodeKind::Listener, data(json!({"name": "car"})))?;
    let email = store.create(
        NodeKind::Event,
        data(json!({"action": "notify", "type": "Email", "recipient": "me@example.com"})),
    )?;
    let light = store.create(
        NodeKind::Accessory,
        data(json!({"name": "porch light", "type": "Smart Light Bulb"})),
    )?;

    engine.link(&night, &person)?;
    engine.link(&yard, &person)?;
    engine.link(&person, &email)?;
    engine.link(&person, &light)?;
    Ok(project)
}

/// Graph shape keyed by payload so it can be compared across id remaps
fn shape(project: &ProjectGraph) -> Result<BTreeSet<String>> {
    let records = project.store().list(None)?;
    let names: BTreeMap<&str, String> = records
        .iter()
        .map(|r| (r.id(), serde_json::to_string(&r.payload().to_map()).unwrap_or_default()))
        .collect();

    Ok(records
        .iter()
        .map(|r: &NodeRecord| {
            let targets: Vec<&str> = r
                .outgoing()
                .iter()
                .filter_map(|t| names.get(t.as_str()).map(String::as_str))
                .collect();
            format!("{}|{}|{:?}", r.kind(), names[r.id()], targets)
        })
        .collect())
}

// =========================================================================
// Flat Export / Import
// =========================================================================

#[test]
fn test_export_import_round_trip() -> Result<()> {
    let source = create_sample_project()?;
    let document = source.export()?;
    assert_eq!(document.nodes.len(), 6);
    assert!(document.exported_at.is_some());

    let target = ProjectGraph::in_memory("copy");
    let summary = target.import(&document)?;
    assert_eq!(summary.imported, 6);
    assert!(summary.remapped.is_empty());

    assert_eq!(target.store().len()?, 6);
    assert_eq!(shape(&target)?, shape(&source)?);
    Ok(())
}

#[test]
fn test_import_into_same_project_remaps_ids() -> Result<()> {
    let project = create_sample_project()?;
    let before = shape(&project)?;
    let document = project.export()?;

    let summary = project.import(&document)?;
    assert_eq!(summary.remapped.len(), 6);
    assert_eq!(project.store().len()?, 12);

    // The imported copy has the same shape as the original
    for (old_id, new_id) in &summary.remapped {
        let original = project.store().get(old_id)?;
        let copy = project.store().get(new_id)?;
        assert_eq!(original.kind(), copy.kind());
        assert_eq!(original.payload(), copy.payload());
        let remapped_targets: Vec<String> = original
            .outgoing()
            .iter()
            .map(|t| summary.remapped[t].clone())
            .collect();
        assert_eq!(copy.outgoing(), remapped_targets.as_slice());
    }
    assert_eq!(shape(&project)?, before);
    Ok(())
}

#[test]
fn test_import_rejects_unknown_kind_without_writing() -> Result<()> {
    let document: ExportDocument = serde_json::from_value(json!({
        "nodes": [
            {"id": "l1", "kind": "Listener", "payload": {"name": "person"}, "outgoing": []},
            {"id": "x1", "kind": "Trigger", "payload": {}, "outgoing": []}
        ]
    }))?;

    let project = ProjectGraph::in_memory("p");
    let err = project.import(&document).unwrap_err();
    assert!(matches!(err, GraphError::InvalidKind(ref k) if k == "Trigger"));
    assert_eq!(project.store().len()?, 0);
    Ok(())
}

#[test]
fn test_import_rejects_illegal_reference_without_writing() -> Result<()> {
    let document: ExportDocument = serde_json::from_value(json!({
        "nodes": [
            {"id": "c1", "kind": "Condition", "payload": {}, "outgoing": ["e1"]},
            {"id": "e1", "kind": "Event", "payload": {}, "outgoing": []}
        ]
    }))?;

    let project = ProjectGraph::in_memory("p");
    assert!(matches!(
        project.import(&document),
        Err(GraphError::IllegalConnection { .. })
    ));
    assert_eq!(project.store().len()?, 0);
    Ok(())
}

#[test]
fn test_import_rejects_dangling_reference() -> Result<()> {
    let document: ExportDocument = serde_json::from_value(json!({
        "nodes": [{"id": "l1", "kind": "Listener", "payload": {}, "outgoing": ["gone"]}]
    }))?;

    let project = ProjectGraph::in_memory("p");
    assert!(matches!(project.import(&document), Err(GraphError::NotFound { .. })));
    Ok(())
}

// =========================================================================
// Listener Export and Prompts
// =========================================================================

#[test]
fn test_listener_export_groups_by_listener() -> Result<()> {
    let project = create_sample_project()?;
    let export = project.export_listeners()?;

    assert_eq!(export.total_listeners, 2);
    let person = &export.listeners[0];
    assert_eq!(person.listener_data["name"], "person");
    assert_eq!(person.conditions.len(), 2);
    assert_eq!(person.events.len(), 1);
    assert_eq!(person.events[0].event_data["type"], "Email");
    assert_eq!(person.accessories.len(), 1);

    let car = &export.listeners[1];
    assert!(car.conditions.is_empty());
    assert!(car.events.is_empty());

    let value = serde_json::to_value(&export)?;
    assert!(value["listeners"][0]["listener_id"].is_string());
    assert!(value["listeners"][0]["conditions"][0]["condition_data"].is_object());
    // Accessories are omitted when a listener has none
    assert!(value["listeners"][1].get("accessories").is_none());
    Ok(())
}

#[test]
fn test_listener_prompts() -> Result<()> {
    let project = create_sample_project()?;
    let prompts = project.listener_prompts()?;

    assert_eq!(prompts.len(), 2);
    assert_eq!(
        prompts[0].prompt,
        "Goal: person (object), Constraints: nighttime, threshold: 0.8, type: time; backyard, type: zone"
    );
    assert_eq!(prompts[1].prompt, "Goal: car, Constraints: none");
    Ok(())
}

#[test]
fn test_integer_threshold_prompt_keeps_integer_form() -> Result<()> {
    let project = ProjectGraph::in_memory("p");
    let crowd = project.store().create(
        NodeKind::Condition,
        data(json!({"name": "crowd", "threshold": 75, "type": "count"})),
    )?;
    let person = project
        .store()
        .create(NodeKind::Listener, data(json!({"name": "person"})))?;
    project.engine().link(&crowd, &person)?;

    let prompts = project.listener_prompts()?;
    assert_eq!(
        prompts[0].prompt,
        "Goal: person, Constraints: crowd, threshold: 75, type: count"
    );
    Ok(())
}

// =========================================================================
// Files
// =========================================================================

#[test]
fn test_export_and_import_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("export.json");

    let source = create_sample_project()?;
    source.export_to_path(&path)?;

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(raw["nodes"].as_array().map(Vec::len), Some(6));
    assert!(raw["exportedAt"].is_string());

    let target = ProjectGraph::in_memory("copy");
    target.import_from_path(&path)?;
    assert_eq!(shape(&target)?, shape(&source)?);
    Ok(())
}

#[test]
fn test_import_of_malformed_file_is_invalid_document() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("broken.json");
    std::fs::write(&path, "{\"nodes\": 42}")?;

    let project = ProjectGraph::in_memory("p");
    assert!(matches!(
        project.import_from_path(&path),
        Err(GraphError::InvalidDocument(_))
    ));
    Ok(())
}
