//! Tests for typed node payloads

#[cfg(test)]
mod tests {
    use crate::models::{NodeKind, NodePayload, PayloadMap, Position, ValidationError};
    use serde_json::json;

    fn map(value: serde_json::Value) -> PayloadMap {
        value.as_object().cloned().unwrap()
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_condition_fields_are_typed() {
        let payload = NodePayload::from_map(
            NodeKind::Condition,
            map(json!({"name": "nighttime", "type": "time", "threshold": 0.75})),
        )
        .unwrap();

        match payload {
            NodePayload::Condition(condition) => {
                assert_eq!(condition.name.as_deref(), Some("nighttime"));
                assert_eq!(condition.category.as_deref(), Some("time"));
                assert_eq!(condition.threshold.as_ref().and_then(|t| t.as_f64()), Some(0.75));
                assert!(condition.extra.is_empty());
            }
            other => panic!("expected condition payload, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_threshold_stays_integer() {
        let payload = NodePayload::from_map(
            NodeKind::Condition,
            map(json!({"name": "crowd", "threshold": 75})),
        )
        .unwrap();

        let written = payload.to_map();
        assert_eq!(written["threshold"], json!(75));
        assert_eq!(written["threshold"].to_string(), "75");
    }

    #[test]
    fn test_event_type_is_channel() {
        let payload = NodePayload::from_map(
            NodeKind::Event,
            map(json!({"action": "notify", "type": "Text", "recipient": "+15550100"})),
        )
        .unwrap();

        assert_eq!(payload.kind(), NodeKind::Event);
        assert_eq!(payload.display_name(), Some("notify"));
        assert_eq!(payload.category(), Some("Text"));
    }

    #[test]
    fn test_unknown_scalar_keys_are_kept() {
        let payload = NodePayload::from_map(
            NodeKind::Listener,
            map(json!({"name": "person", "confidence": 0.9, "enabled": true})),
        )
        .unwrap();

        assert_eq!(payload.extra().get("confidence"), Some(&json!(0.9)));
        assert_eq!(payload.extra().get("enabled"), Some(&json!(true)));
    }

    #[test]
    fn test_layout_keys_parse_into_layout() {
        let payload = NodePayload::from_map(
            NodeKind::Accessory,
            map(json!({
                "name": "porch light",
                "position.x": 640.0,
                "position.y": 140,
                "description": "front door"
            })),
        )
        .unwrap();

        assert_eq!(payload.layout().position, Some(Position::new(640.0, 140.0)));
        assert_eq!(payload.layout().description.as_deref(), Some("front door"));
        assert!(payload.extra().is_empty());
    }

    #[test]
    fn test_null_values_are_absent() {
        let payload =
            NodePayload::from_map(NodeKind::Condition, map(json!({"name": null, "threshold": null})))
                .unwrap();
        assert_eq!(payload, NodePayload::empty(NodeKind::Condition));
    }

    // ========================================================================
    // Rejections
    // ========================================================================

    #[test]
    fn test_rejects_nested_values() {
        let nested = NodePayload::from_map(NodeKind::Listener, map(json!({"zones": ["a", "b"]})));
        assert!(matches!(nested, Err(ValidationError::InvalidProperties(_))));

        let object = NodePayload::from_map(NodeKind::Listener, map(json!({"meta": {"a": 1}})));
        assert!(matches!(object, Err(ValidationError::InvalidProperties(_))));
    }

    #[test]
    fn test_rejects_half_position() {
        let result = NodePayload::from_map(NodeKind::Event, map(json!({"position.x": 1.0})));
        assert!(matches!(result, Err(ValidationError::InvalidProperties(_))));
    }

    #[test]
    fn test_rejects_wrongly_typed_known_key() {
        let threshold = NodePayload::from_map(NodeKind::Condition, map(json!({"threshold": "high"})));
        assert!(matches!(threshold, Err(ValidationError::InvalidProperties(_))));

        let name = NodePayload::from_map(NodeKind::Listener, map(json!({"name": 42})));
        assert!(matches!(name, Err(ValidationError::InvalidProperties(_))));
    }

    // ========================================================================
    // Flattening
    // ========================================================================

    #[test]
    fn test_to_map_restores_flat_form() {
        let original = map(json!({
            "name": "person",
            "type": "object",
            "position.x": 320.0,
            "position.y": 0.0,
            "confidence": 0.9
        }));
        let payload = NodePayload::from_map(NodeKind::Listener, original.clone()).unwrap();
        assert_eq!(payload.to_map(), original);
    }

    #[test]
    fn test_data_map_drops_layout() {
        let payload = NodePayload::from_map(
            NodeKind::Condition,
            map(json!({"name": "rain", "position.x": 1.0, "position.y": 2.0, "description": "d"})),
        )
        .unwrap();
        assert_eq!(payload.data_map(), map(json!({"name": "rain"})));
    }
}
