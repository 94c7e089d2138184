//! Typed Node Payloads
//!
//! Each node kind carries its own payload variant with the fields its kind
//! understands, plus an `extra` map for any other scalar keys. The durable
//! and wire form is a flat string → scalar map; layout is stored in that map
//! under the keys `position.x`, `position.y` and `description`.
//!
//! # Examples
//!
//! ```rust
//! use rulegraph_core::models::{NodeKind, NodePayload};
//! use serde_json::json;
//!
//! let map = json!({"name": "person", "type": "object", "position.x": 10.0, "position.y": 20.0});
//! let payload = NodePayload::from_map(NodeKind::Listener, map.as_object().cloned().unwrap()).unwrap();
//!
//! assert_eq!(payload.display_name(), Some("person"));
//! assert_eq!(payload.layout().position.map(|p| p.x), Some(10.0));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::node::{NodeKind, ValidationError};

/// Flat scalar map used as the durable and wire form of a payload
pub type PayloadMap = serde_json::Map<String, Value>;

pub const KEY_POSITION_X: &str = "position.x";
pub const KEY_POSITION_Y: &str = "position.y";
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_NAME: &str = "name";
pub const KEY_TYPE: &str = "type";
pub const KEY_THRESHOLD: &str = "threshold";
pub const KEY_ACTION: &str = "action";
pub const KEY_MESSAGE: &str = "message";
pub const KEY_RECIPIENT: &str = "recipient";

/// Keys that belong to the canvas layout rather than to the node's domain data
pub const LAYOUT_KEYS: [&str; 3] = [KEY_POSITION_X, KEY_POSITION_Y, KEY_DESCRIPTION];

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Layout attributes shared by every kind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub position: Option<Position>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionPayload {
    pub layout: Layout,
    pub name: Option<String>,
    /// Condition category (`time`, `zone`, `weather`, ...), stored under `type`
    pub category: Option<String>,
    /// Kept as written so integer thresholds stay integers
    pub threshold: Option<Number>,
    pub extra: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListenerPayload {
    pub layout: Layout,
    pub name: Option<String>,
    /// Detection category (`object`, `motion`, `face`, ...), stored under `type`
    pub category: Option<String>,
    pub extra: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventPayload {
    pub layout: Layout,
    pub action: Option<String>,
    /// Delivery channel (`Email`, `Text`, `Emergency`), stored under `type`
    pub channel: Option<String>,
    pub message: Option<String>,
    pub recipient: Option<String>,
    pub extra: PayloadMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccessoryPayload {
    pub layout: Layout,
    pub name: Option<String>,
    /// Device class (`Smart Plug`, `Smart Lock`, ...), stored under `type`
    pub device: Option<String>,
    pub extra: PayloadMap,
}

/// Kind-specific payload of a node record
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Condition(ConditionPayload),
    Listener(ListenerPayload),
    Event(EventPayload),
    Accessory(AccessoryPayload),
}

impl NodePayload {
    /// Empty payload of the given kind
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Condition => NodePayload::Condition(ConditionPayload::default()),
            NodeKind::Listener => NodePayload::Listener(ListenerPayload::default()),
            NodeKind::Event => NodePayload::Event(EventPayload::default()),
            NodeKind::Accessory => NodePayload::Accessory(AccessoryPayload::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Condition(_) => NodeKind::Condition,
            NodePayload::Listener(_) => NodeKind::Listener,
            NodePayload::Event(_) => NodeKind::Event,
            NodePayload::Accessory(_) => NodeKind::Accessory,
        }
    }

    pub fn layout(&self) -> &Layout {
        match self {
            NodePayload::Condition(p) => &p.layout,
            NodePayload::Listener(p) => &p.layout,
            NodePayload::Event(p) => &p.layout,
            NodePayload::Accessory(p) => &p.layout,
        }
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        match self {
            NodePayload::Condition(p) => &mut p.layout,
            NodePayload::Listener(p) => &mut p.layout,
            NodePayload::Event(p) => &mut p.layout,
            NodePayload::Accessory(p) => &mut p.layout,
        }
    }

    /// Keys not understood by this kind, kept verbatim
    pub fn extra(&self) -> &PayloadMap {
        match self {
            NodePayload::Condition(p) => &p.extra,
            NodePayload::Listener(p) => &p.extra,
            NodePayload::Event(p) => &p.extra,
            NodePayload::Accessory(p) => &p.extra,
        }
    }

    /// Human-readable name (`name`, or `action` for events)
    pub fn display_name(&self) -> Option<&str> {
        match self {
            NodePayload::Condition(p) => p.name.as_deref(),
            NodePayload::Listener(p) => p.name.as_deref(),
            NodePayload::Event(p) => p.action.as_deref(),
            NodePayload::Accessory(p) => p.name.as_deref(),
        }
    }

    /// Value stored under the `type` key for this kind
    pub fn category(&self) -> Option<&str> {
        match self {
            NodePayload::Condition(p) => p.category.as_deref(),
            NodePayload::Listener(p) => p.category.as_deref(),
            NodePayload::Event(p) => p.channel.as_deref(),
            NodePayload::Accessory(p) => p.device.as_deref(),
        }
    }

    /// Parse a flat scalar map into the payload variant for `kind`
    ///
    /// Nested arrays or objects, a position with only one coordinate, or a
    /// known key with the wrong scalar type are rejected. `null` values are
    /// treated as absent.
    pub fn from_map(kind: NodeKind, map: PayloadMap) -> Result<Self, ValidationError> {
        let mut fields = FieldReader::new(map)?;
        let layout = fields.take_layout()?;

        let payload = match kind {
            NodeKind::Condition => NodePayload::Condition(ConditionPayload {
                layout,
                name: fields.take_string(KEY_NAME)?,
                category: fields.take_string(KEY_TYPE)?,
                threshold: fields.take_raw_number(KEY_THRESHOLD)?,
                extra: fields.into_rest(),
            }),
            NodeKind::Listener => NodePayload::Listener(ListenerPayload {
                layout,
                name: fields.take_string(KEY_NAME)?,
                category: fields.take_string(KEY_TYPE)?,
                extra: fields.into_rest(),
            }),
            NodeKind::Event => NodePayload::Event(EventPayload {
                layout,
                action: fields.take_string(KEY_ACTION)?,
                channel: fields.take_string(KEY_TYPE)?,
                message: fields.take_string(KEY_MESSAGE)?,
                recipient: fields.take_string(KEY_RECIPIENT)?,
                extra: fields.into_rest(),
            }),
            NodeKind::Accessory => NodePayload::Accessory(AccessoryPayload {
                layout,
                name: fields.take_string(KEY_NAME)?,
                device: fields.take_string(KEY_TYPE)?,
                extra: fields.into_rest(),
            }),
        };

        Ok(payload)
    }

    /// Flatten back into the durable scalar map
    pub fn to_map(&self) -> PayloadMap {
        let mut map = self.extra().clone();
        let layout = self.layout();

        if let Some(position) = layout.position {
            put_number(&mut map, KEY_POSITION_X, Some(position.x));
            put_number(&mut map, KEY_POSITION_Y, Some(position.y));
        }
        put_string(&mut map, KEY_DESCRIPTION, layout.description.as_deref());

        match self {
            NodePayload::Condition(p) => {
                put_string(&mut map, KEY_NAME, p.name.as_deref());
                put_string(&mut map, KEY_TYPE, p.category.as_deref());
                if let Some(threshold) = &p.threshold {
                    map.insert(KEY_THRESHOLD.to_string(), Value::Number(threshold.clone()));
                }
            }
            NodePayload::Listener(p) => {
                put_string(&mut map, KEY_NAME, p.name.as_deref());
                put_string(&mut map, KEY_TYPE, p.category.as_deref());
            }
            NodePayload::Event(p) => {
                put_string(&mut map, KEY_ACTION, p.action.as_deref());
                put_string(&mut map, KEY_TYPE, p.channel.as_deref());
                put_string(&mut map, KEY_MESSAGE, p.message.as_deref());
                put_string(&mut map, KEY_RECIPIENT, p.recipient.as_deref());
            }
            NodePayload::Accessory(p) => {
                put_string(&mut map, KEY_NAME, p.name.as_deref());
                put_string(&mut map, KEY_TYPE, p.device.as_deref());
            }
        }

        map
    }

    /// Domain data without layout keys
    pub fn data_map(&self) -> PayloadMap {
        let mut map = self.to_map();
        for key in LAYOUT_KEYS {
            map.remove(key);
        }
        map
    }
}

fn put_string(map: &mut PayloadMap, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn put_number(map: &mut PayloadMap, key: &str, value: Option<f64>) {
    if let Some(number) = value.and_then(Number::from_f64) {
        map.insert(key.to_string(), Value::Number(number));
    }
}

/// Consumes known keys out of a payload map, leaving the rest as `extra`
struct FieldReader {
    map: PayloadMap,
}

impl FieldReader {
    fn new(map: PayloadMap) -> Result<Self, ValidationError> {
        let mut scalars = PayloadMap::new();
        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::Array(_) | Value::Object(_) => {
                    return Err(ValidationError::InvalidProperties(format!(
                        "'{}' must be a scalar value",
                        key
                    )));
                }
                scalar => {
                    scalars.insert(key, scalar);
                }
            }
        }
        Ok(Self { map: scalars })
    }

    fn take_string(&mut self, key: &str) -> Result<Option<String>, ValidationError> {
        match self.map.remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ValidationError::InvalidProperties(format!(
                "'{}' must be a string, got {}",
                key, other
            ))),
        }
    }

    fn take_raw_number(&mut self, key: &str) -> Result<Option<Number>, ValidationError> {
        match self.map.remove(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n)),
            Some(other) => Err(ValidationError::InvalidProperties(format!(
                "'{}' must be a number, got {}",
                key, other
            ))),
        }
    }

    fn take_number(&mut self, key: &str) -> Result<Option<f64>, ValidationError> {
        match self.take_raw_number(key)? {
            None => Ok(None),
            Some(n) => n.as_f64().map(Some).ok_or_else(|| {
                ValidationError::InvalidProperties(format!("'{}' is not representable", key))
            }),
        }
    }

    fn take_layout(&mut self) -> Result<Layout, ValidationError> {
        let x = self.take_number(KEY_POSITION_X)?;
        let y = self.take_number(KEY_POSITION_Y)?;
        let position = match (x, y) {
            (Some(x), Some(y)) => Some(Position { x, y }),
            (None, None) => None,
            _ => {
                return Err(ValidationError::InvalidProperties(
                    "position requires both position.x and position.y".to_string(),
                ))
            }
        };

        Ok(Layout {
            position,
            description: self.take_string(KEY_DESCRIPTION)?,
        })
    }

    fn into_rest(self) -> PayloadMap {
        self.map
    }
}
