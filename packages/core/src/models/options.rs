//! Option Catalogs
//!
//! Static lists the node editor offers when the user picks a node's type.

use super::node::NodeKind;

const CONDITION_OPTIONS: &[&str] = &[
    "weather: rain/snow/fog",
    "lighting: day/night/low-light",
    "time",
    "zone",
    "duration",
    "frequency",
    "custom",
];

const LISTENER_OPTIONS: &[&str] = &[
    "object (person, car, animal, package)",
    "activity (walking, running, fighting)",
    "motion",
    "face (known / unknown)",
    "license_plate",
    "gesture (hands up, waving)",
    "custom_prompt (natural language)",
    "custom",
];

const EVENT_OPTIONS: &[&str] = &["Email", "Text", "Emergency"];

const ACCESSORY_OPTIONS: &[&str] = &[
    "Smart Light Bulb",
    "Smart Plug",
    "Motion Sensor",
    "Smart Switch",
    "Smart Lock",
    "Smart Thermostat",
];

impl NodeKind {
    /// Editor catalog of `type` choices for this kind
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Condition => CONDITION_OPTIONS,
            NodeKind::Listener => LISTENER_OPTIONS,
            NodeKind::Event => EVENT_OPTIONS,
            NodeKind::Accessory => ACCESSORY_OPTIONS,
        }
    }
}
