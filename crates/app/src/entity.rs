//! The contract every homee-backed host entity fulfils.

use homee_bridge_domain::device::{DeviceIdentifier, DeviceInfo};
use homee_bridge_domain::entity::{EntitySnapshot, Platform};
use homee_bridge_domain::error::{BridgeError, ValidationError};
use homee_bridge_domain::listener::Subscription;
use serde_json::{Value, json};

use crate::node_handle::NodeHandle;
use crate::service_registry::BoxFuture;

/// State shared by every entity: its node, its unique id and the entry-level
/// settings that affect what it publishes.
#[derive(Debug, Clone)]
pub struct EntityBase {
    pub handle: NodeHandle,
    pub unique_id: String,
    pub hub: Option<DeviceIdentifier>,
    pub add_homee_data: bool,
}

impl EntityBase {
    /// Start a snapshot carrying identity and availability.
    #[must_use]
    pub fn snapshot(&self, platform: Platform, name: Option<String>) -> EntitySnapshot {
        let mut snapshot = EntitySnapshot::new(&self.unique_id, platform, self.handle.node_id());
        snapshot.name = name;
        snapshot.available = self.handle.read().is_available();
        snapshot
    }
}

/// A host entity synthesized from a hub node.
pub trait HomeeEntity: Send + Sync {
    fn platform(&self) -> Platform;

    fn base(&self) -> &EntityBase;

    /// Entity name; `None` means "use the device name".
    fn name(&self) -> Option<String>;

    /// Current state and platform attributes.
    fn snapshot(&self) -> EntitySnapshot;

    /// Run a platform command such as `turn_on` or `set_cover_position`.
    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>>;

    fn unique_id(&self) -> &str {
        &self.base().unique_id
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_node(&self.base().handle.read(), self.base().hub.as_ref())
    }

    /// Raw node data, when the entry enables `add_homee_data`.
    fn extra_state_attributes(&self) -> Option<Value> {
        let base = self.base();
        if !base.add_homee_data {
            return None;
        }
        let node = base.handle.read();
        let attributes: Vec<Value> = node
            .attributes
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "type": a.attribute_type,
                    "instance": a.instance,
                    "current_value": a.current_value,
                    "unit": a.unit,
                })
            })
            .collect();
        Some(json!({
            "homee_data": {
                "id": node.id,
                "name": node.name,
                "profile": node.profile,
                "attributes": attributes,
            }
        }))
    }

    /// Call `on_update` after every attribute change of the entity's node.
    fn add_update_listener(&self, on_update: Box<dyn Fn() + Send + Sync>) -> Subscription {
        self.base()
            .handle
            .register_listener(move |_, _| on_update())
    }
}

/// Error for a service the entity's platform does not implement.
pub(crate) fn unsupported(service: &str, platform: Platform) -> BridgeError {
    ValidationError::UnsupportedService {
        service: service.to_string(),
        platform: platform.as_str(),
    }
    .into()
}
