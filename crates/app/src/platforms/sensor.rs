//! Sensor platform — read-only numeric values.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::entity::{
    EntitySnapshot, EntityState, Platform, SensorDeviceClass, StateClass,
};
use homee_bridge_domain::error::BridgeError;
use homee_bridge_domain::id::AttributeId;
use homee_bridge_domain::node::{Attribute, Node, read_node};
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

pub const SENSOR_ATTRIBUTES: &[AttributeType] = &[
    AttributeType::CURRENT_ENERGY_USE,
    AttributeType::ACCUMULATED_ENERGY_USE,
    AttributeType::POSITION,
    AttributeType::UP_DOWN,
];

const MEASUREMENT_ATTRIBUTES: &[AttributeType] = &[
    AttributeType::CURRENT_ENERGY_USE,
    AttributeType::POSITION,
    AttributeType::UP_DOWN,
];

#[must_use]
pub fn is_sensor_attribute(attribute: &Attribute) -> bool {
    SENSOR_ATTRIBUTES.contains(&attribute.attribute_type)
}

#[must_use]
pub fn sensor_device_class(attribute_type: AttributeType) -> Option<SensorDeviceClass> {
    match attribute_type {
        AttributeType::CURRENT_ENERGY_USE => Some(SensorDeviceClass::Power),
        AttributeType::ACCUMULATED_ENERGY_USE => Some(SensorDeviceClass::Energy),
        _ => None,
    }
}

#[must_use]
pub fn sensor_state_class(attribute_type: AttributeType) -> Option<StateClass> {
    if MEASUREMENT_ATTRIBUTES.contains(&attribute_type) {
        Some(StateClass::Measurement)
    } else if attribute_type == AttributeType::ACCUMULATED_ENERGY_USE {
        Some(StateClass::TotalIncreasing)
    } else {
        None
    }
}

/// Name of the `index`-th sensor of its attribute type on a node.
#[must_use]
pub fn sensor_name(attribute: &Attribute, index: usize) -> String {
    let base = if !attribute.name.is_empty() && attribute.name != "None" {
        attribute.name.clone()
    } else if let Some(class) = sensor_device_class(attribute.attribute_type) {
        class.as_str().to_string()
    } else {
        attribute.attribute_type.to_string()
    };
    if index > 0 {
        format!("{base} {}", index + 1)
    } else {
        base
    }
}

#[derive(Debug)]
pub struct HomeeSensor {
    base: EntityBase,
    attribute: AttributeId,
    attribute_type: AttributeType,
    name: String,
}

impl HomeeSensor {
    #[must_use]
    pub fn new(base: EntityBase, attribute: &Attribute, name: String) -> Self {
        Self {
            base,
            attribute: attribute.id,
            attribute_type: attribute.attribute_type,
            name,
        }
    }

    #[must_use]
    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

impl HomeeEntity for HomeeSensor {
    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::Sensor, self.name());
        let Some(attribute) = self.base.handle.attribute_by_id(self.attribute) else {
            return snapshot;
        };
        snapshot.state = EntityState::Value(attribute.current_value);
        if !attribute.unit.is_empty() {
            snapshot.set_attribute("unit_of_measurement", attribute.unit);
        }
        if let Some(class) = sensor_device_class(self.attribute_type) {
            snapshot.set_attribute("device_class", class.as_str());
        }
        if let Some(class) = sensor_state_class(self.attribute_type) {
            snapshot.set_attribute("state_class", class.as_str());
        }
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        _data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move { Err(unsupported(service, Platform::Sensor)) })
    }
}

fn node_sensors(node: &Node) -> Vec<(&Attribute, usize)> {
    let mut seen: Vec<AttributeType> = Vec::new();
    node.attributes
        .iter()
        .filter(|a| is_sensor_attribute(a))
        .map(|a| {
            let index = seen.iter().filter(|t| **t == a.attribute_type).count();
            seen.push(a.attribute_type);
            (a, index)
        })
        .collect()
}

/// One sensor per sensor-typed attribute of every imported node with a
/// recognized profile.
#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeSensor> {
    let mut sensors = Vec::new();
    for shared in &ctx.nodes {
        let node = read_node(shared);
        if !node.profile.is_known() {
            continue;
        }
        for (attribute, index) in node_sensors(&node) {
            let unique_id = format!("{}-sensor-{}", node.id, attribute.id);
            let name = sensor_name(attribute, index);
            tracing::debug!(node = %node.id, attribute = %attribute.id, %name, "discovered sensor");
            sensors.push(HomeeSensor::new(ctx.base(shared, unique_id), attribute, name));
        }
    }
    sensors
}
