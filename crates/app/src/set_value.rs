//! The `homee.set_value` service payload.

use homee_bridge_domain::error::ValidationError;
use homee_bridge_domain::id::{AttributeId, ConfigEntryId, NodeId};
use serde_json::{Value, json};

/// Service name registered under the `homee` domain.
pub const SERVICE_SET_VALUE: &str = "set_value";

pub const ATTR_NODE: &str = "node";
pub const ATTR_ATTRIBUTE: &str = "attribute";
pub const ATTR_VALUE: &str = "value";
/// Optional routing field; without it the call goes to the first loaded hub.
pub const ATTR_CONFIG_ENTRY: &str = "config_entry_id";

/// Decoded `homee.set_value` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetValueRequest {
    pub node: NodeId,
    pub attribute: AttributeId,
    pub value: f64,
    pub entry: Option<ConfigEntryId>,
}

impl SetValueRequest {
    /// Read a request from service data.
    ///
    /// Missing `node`, `attribute` and `value` default to 0. Numbers and
    /// numeric strings are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidServiceField`] for a field that is
    /// present but not numeric, or a `config_entry_id` that is not a UUID.
    pub fn from_data(data: &Value) -> Result<Self, ValidationError> {
        let node = read_id(data, ATTR_NODE)?;
        let attribute = read_id(data, ATTR_ATTRIBUTE)?;
        let value = read_number(data, ATTR_VALUE)?.unwrap_or(0.0);
        let entry = match data.get(ATTR_CONFIG_ENTRY) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                raw.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ValidationError::InvalidServiceField {
                        field: ATTR_CONFIG_ENTRY,
                    })?,
            ),
        };
        Ok(Self {
            node: NodeId(node),
            attribute: AttributeId(attribute),
            value,
            entry,
        })
    }

    /// Encode as service data.
    #[must_use]
    pub fn to_data(&self) -> Value {
        let mut data = json!({
            ATTR_NODE: self.node.get(),
            ATTR_ATTRIBUTE: self.attribute.get(),
            ATTR_VALUE: self.value,
        });
        if let (Some(entry), Some(map)) = (self.entry, data.as_object_mut()) {
            map.insert(ATTR_CONFIG_ENTRY.to_string(), json!(entry.to_string()));
        }
        data
    }
}

fn read_number(data: &Value, field: &'static str) -> Result<Option<f64>, ValidationError> {
    let invalid = ValidationError::InvalidServiceField { field };
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(invalid),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(invalid),
        },
        Some(_) => Err(invalid),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_id(data: &Value, field: &'static str) -> Result<u32, ValidationError> {
    match read_number(data, field)? {
        None => Ok(0),
        Some(n) if n >= 0.0 && n <= f64::from(u32::MAX) => Ok(n.trunc() as u32),
        Some(_) => Err(ValidationError::InvalidServiceField { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_numeric_fields() {
        let req = SetValueRequest::from_data(&json!({"node": 4, "attribute": 12, "value": 55.5}))
            .unwrap();
        assert_eq!(req.node, NodeId(4));
        assert_eq!(req.attribute, AttributeId(12));
        assert!((req.value - 55.5).abs() < f64::EPSILON);
        assert!(req.entry.is_none());
    }

    #[test]
    fn should_default_missing_fields_to_zero() {
        let req = SetValueRequest::from_data(&json!({})).unwrap();
        assert_eq!(req.node, NodeId(0));
        assert_eq!(req.attribute, AttributeId(0));
        assert!(req.value.abs() < f64::EPSILON);
    }

    #[test]
    fn should_accept_numeric_strings() {
        let req =
            SetValueRequest::from_data(&json!({"node": "7", "attribute": " 3 ", "value": "1"}))
                .unwrap();
        assert_eq!(req.node, NodeId(7));
        assert_eq!(req.attribute, AttributeId(3));
        assert!((req.value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_non_numeric_field() {
        let err = SetValueRequest::from_data(&json!({"node": "kitchen"})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidServiceField { field: "node" });
    }

    #[test]
    fn should_reject_non_finite_value() {
        for value in ["NaN", "inf", "-infinity"] {
            let err = SetValueRequest::from_data(&json!({"value": value})).unwrap_err();
            assert_eq!(err, ValidationError::InvalidServiceField { field: "value" });
        }
        let err = SetValueRequest::from_data(&json!({"node": "NaN"})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidServiceField { field: "node" });
    }

    #[test]
    fn should_reject_negative_id() {
        let err = SetValueRequest::from_data(&json!({"attribute": -1})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidServiceField { field: "attribute" });
    }

    #[test]
    fn should_carry_entry_id_through_data() {
        let entry = ConfigEntryId::new();
        let req = SetValueRequest {
            node: NodeId(1),
            attribute: AttributeId(2),
            value: 0.0,
            entry: Some(entry),
        };
        let parsed = SetValueRequest::from_data(&req.to_data()).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn should_reject_malformed_entry_id() {
        let err = SetValueRequest::from_data(&json!({"config_entry_id": "nope"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidServiceField {
                field: "config_entry_id"
            }
        );
    }
}
