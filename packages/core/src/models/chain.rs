//! Read models for chain queries and listener-centric exports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::node::{NodeDocument, NodeRecord};
use super::payload::PayloadMap;

/// A condition together with its listener and everything that listener drives
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullChain {
    pub condition: NodeRecord,
    pub listeners: Vec<ListenerBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerBranch {
    pub listener: NodeRecord,
    pub events: Vec<NodeRecord>,
    pub accessories: Vec<NodeRecord>,
}

impl FullChain {
    /// Every node id in the chain, condition first
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.condition.id()];
        for branch in &self.listeners {
            ids.push(branch.listener.id());
            ids.extend(branch.events.iter().map(|n| n.id()));
            ids.extend(branch.accessories.iter().map(|n| n.id()));
        }
        ids
    }
}

/// Flat whole-project export document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// Result of importing an export document
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    /// Document ids that collided with existing nodes, mapped to their new ids
    pub remapped: BTreeMap<String, String>,
}

/// Listener-centric export consumed by the detection pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListenerExport {
    pub listeners: Vec<ListenerEntry>,
    pub total_listeners: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerEntry {
    pub listener_id: String,
    pub listener_data: PayloadMap,
    pub conditions: Vec<ConditionEntry>,
    pub events: Vec<EventEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<AccessoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub condition_id: String,
    pub condition_data: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub event_id: String,
    pub event_data: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryEntry {
    pub accessory_id: String,
    pub accessory_data: PayloadMap,
}

/// Natural-language detection prompt built for one listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerPrompt {
    pub listener_id: String,
    pub prompt: String,
}
