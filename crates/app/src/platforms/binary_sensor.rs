//! Binary sensor platform — contacts, locks and plug states.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::config_entry::EntryOptions;
use homee_bridge_domain::entity::{BinarySensorDeviceClass, EntitySnapshot, EntityState, Platform};
use homee_bridge_domain::error::BridgeError;
use homee_bridge_domain::node::{Node, read_node};
use homee_bridge_domain::profile::NodeProfile;
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

pub const BINARY_SENSOR_PROFILES: &[NodeProfile] = &[
    NodeProfile::OPEN_CLOSE_SENSOR,
    NodeProfile::OPEN_CLOSE_AND_TEMPERATURE_SENSOR,
    NodeProfile::OPEN_CLOSE_WITH_TEMPERATURE_AND_BRIGHTNESS_SENSOR,
    NodeProfile::LOCK,
];

#[must_use]
pub fn is_binary_sensor_node(node: &Node) -> bool {
    BINARY_SENSOR_PROFILES.contains(&node.profile)
}

/// Device class and state attribute from the node's attributes alone.
///
/// LOCK_STATE wins over ON_OFF, which wins over OPEN_CLOSE.
#[must_use]
pub fn binary_sensor_class(node: &Node) -> (BinarySensorDeviceClass, AttributeType) {
    if node.has_attribute(AttributeType::LOCK_STATE) {
        (BinarySensorDeviceClass::Lock, AttributeType::LOCK_STATE)
    } else if node.has_attribute(AttributeType::ON_OFF) {
        (BinarySensorDeviceClass::Plug, AttributeType::ON_OFF)
    } else {
        (BinarySensorDeviceClass::Opening, AttributeType::OPEN_CLOSE)
    }
}

/// Window or door class for nodes in a configured group. Window wins.
#[must_use]
pub fn group_override(node: &Node, options: &EntryOptions) -> Option<BinarySensorDeviceClass> {
    if node
        .groups
        .iter()
        .any(|g| options.window_groups.contains(g))
    {
        Some(BinarySensorDeviceClass::Window)
    } else if node.groups.iter().any(|g| options.door_groups.contains(g)) {
        Some(BinarySensorDeviceClass::Door)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct HomeeBinarySensor {
    base: EntityBase,
    device_class: BinarySensorDeviceClass,
    state_attribute: AttributeType,
}

impl HomeeBinarySensor {
    #[must_use]
    pub fn new(base: EntityBase, node: &Node, options: &EntryOptions) -> Self {
        let (class, state_attribute) = binary_sensor_class(node);
        Self {
            base,
            device_class: group_override(node, options).unwrap_or(class),
            state_attribute,
        }
    }

    #[must_use]
    pub fn device_class(&self) -> BinarySensorDeviceClass {
        self.device_class
    }

    #[must_use]
    pub fn state_attribute(&self) -> AttributeType {
        self.state_attribute
    }

    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.base
            .handle
            .attribute_value(self.state_attribute)
            .ok()
            .map(|v| v != 0.0)
    }
}

impl HomeeEntity for HomeeBinarySensor {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        None
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::BinarySensor, None);
        snapshot.state = self
            .is_on()
            .map_or(EntityState::Unknown, EntityState::from_bool);
        snapshot.set_attribute("device_class", self.device_class.as_str());
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        _data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move { Err(unsupported(service, Platform::BinarySensor)) })
    }
}

#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeBinarySensor> {
    ctx.nodes
        .iter()
        .filter_map(|shared| {
            let node = read_node(shared);
            if !is_binary_sensor_node(&node) {
                return None;
            }
            let (_, state_attribute) = binary_sensor_class(&node);
            let unique_id = format!("{}-binary_sensor-{}", node.id, state_attribute.code());
            let sensor = HomeeBinarySensor::new(ctx.base(shared, unique_id), &node, &ctx.options);
            tracing::debug!(
                node = %node.id,
                device_class = %sensor.device_class(),
                "discovered binary sensor"
            );
            Some(sensor)
        })
        .collect()
}
