//! Commands sent to the hub over the websocket.

use homee_bridge_domain::id::{AttributeId, NodeId};

/// Request for the full hub state, answered with an `all` message.
pub const GET_ALL: &str = "GET:all";

/// Request a new target value for one attribute.
#[must_use]
pub fn set_value(node: NodeId, attribute: AttributeId, value: f64) -> String {
    format!("PUT:/nodes/{node}/attributes/{attribute}?target_value={value}")
}
