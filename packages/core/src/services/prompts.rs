//! Detection prompts for the vision layer
//!
//! Each listener becomes one line of the form
//! `Goal: <name> (<type>), Constraints: <c1>; <c2>` where every constraint
//! is built from one condition pointing at the listener.

use serde_json::Value;

use crate::models::{
    ListenerEntry, ListenerExport, ListenerPrompt, PayloadMap, KEY_NAME, KEY_THRESHOLD, KEY_TYPE,
};

const DEFAULT_GOAL: &str = "detection";

/// Build one prompt per listener, in export order
pub fn listener_prompts(export: &ListenerExport) -> Vec<ListenerPrompt> {
    export
        .listeners
        .iter()
        .map(|entry| ListenerPrompt {
            listener_id: entry.listener_id.clone(),
            prompt: build_prompt(entry),
        })
        .collect()
}

pub fn build_prompt(entry: &ListenerEntry) -> String {
    let data = &entry.listener_data;
    let name = text(data, KEY_NAME).unwrap_or_else(|| DEFAULT_GOAL.to_string());
    let goal = match text(data, KEY_TYPE) {
        Some(kind) => format!("{} ({})", name, kind),
        None => name,
    };

    let constraints: Vec<String> = entry
        .conditions
        .iter()
        .map(|condition| describe_condition(&condition.condition_data))
        .filter(|c| !c.is_empty())
        .collect();

    if constraints.is_empty() {
        format!("Goal: {}, Constraints: none", goal)
    } else {
        format!("Goal: {}, Constraints: {}", goal, constraints.join("; "))
    }
}

fn describe_condition(data: &PayloadMap) -> String {
    let mut parts = Vec::new();
    if let Some(name) = text(data, KEY_NAME) {
        parts.push(name);
    }
    if let Some(threshold) = text(data, KEY_THRESHOLD) {
        parts.push(format!("threshold: {}", threshold));
    }
    if let Some(kind) = text(data, KEY_TYPE) {
        parts.push(format!("type: {}", kind));
    }
    parts.join(", ")
}

/// Non-empty scalar rendered as plain text
fn text(data: &PayloadMap, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
