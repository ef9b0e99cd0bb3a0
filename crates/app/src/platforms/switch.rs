//! Switch platform — plugs and relay channels.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::entity::{EntitySnapshot, EntityState, Platform, SwitchDeviceClass};
use homee_bridge_domain::error::BridgeError;
use homee_bridge_domain::id::AttributeId;
use homee_bridge_domain::node::{Node, read_node};
use homee_bridge_domain::profile::NodeProfile;
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

pub const PLUG_PROFILES: &[NodeProfile] = &[
    NodeProfile::ON_OFF_PLUG,
    NodeProfile::METERING_PLUG,
    NodeProfile::DIMMABLE_METERING_PLUG,
    NodeProfile::DOUBLE_ON_OFF_PLUG,
    NodeProfile::IMPULSE_PLUG,
];

pub const SWITCH_PROFILES: &[NodeProfile] = &[
    NodeProfile::DIMMABLE_METERING_SWITCH,
    NodeProfile::METERING_SWITCH,
    NodeProfile::ON_OFF_SWITCH,
    NodeProfile::DOUBLE_ON_OFF_SWITCH,
    NodeProfile::ON_OFF_SWITCH_WITH_BINARY_INPUT,
    NodeProfile::DOUBLE_METERING_SWITCH,
    NodeProfile::SHUTTER_POSITION_SWITCH,
    NodeProfile::ELECTRIC_MOTOR_METERING_SWITCH,
    NodeProfile::ELECTRIC_MOTOR_METERING_SWITCH_WITHOUT_SLAT_POSITION,
];

#[must_use]
pub fn is_switch_node(node: &Node) -> bool {
    node.has_attribute(AttributeType::ON_OFF)
        && (PLUG_PROFILES.contains(&node.profile) || SWITCH_PROFILES.contains(&node.profile))
}

#[must_use]
pub fn switch_device_class(profile: NodeProfile) -> SwitchDeviceClass {
    if PLUG_PROFILES.contains(&profile) {
        SwitchDeviceClass::Outlet
    } else {
        SwitchDeviceClass::Switch
    }
}

/// Name of the `index`-th switch of `node`, bound to an attribute named
/// `attribute_name`.
#[must_use]
pub fn switch_name(node_name: &str, attribute_name: &str, index: usize) -> String {
    if !attribute_name.is_empty() {
        format!("{node_name} {attribute_name}")
    } else if index > 0 {
        format!("{node_name} {}", index + 1)
    } else {
        node_name.to_string()
    }
}

#[derive(Debug)]
pub struct HomeeSwitch {
    base: EntityBase,
    on_off: AttributeId,
    name: String,
    device_class: SwitchDeviceClass,
}

impl HomeeSwitch {
    #[must_use]
    pub fn new(
        base: EntityBase,
        on_off: AttributeId,
        name: String,
        device_class: SwitchDeviceClass,
    ) -> Self {
        Self {
            base,
            on_off,
            name,
            device_class,
        }
    }

    #[must_use]
    pub fn device_class(&self) -> SwitchDeviceClass {
        self.device_class
    }

    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.base
            .handle
            .attribute_by_id(self.on_off)
            .map(|a| a.is_on())
    }

    /// Power draw of the node in watts, when it meters one.
    #[must_use]
    pub fn current_power_w(&self) -> Option<f64> {
        self.base
            .handle
            .attribute_value(AttributeType::CURRENT_ENERGY_USE)
            .ok()
    }
}

impl HomeeEntity for HomeeSwitch {
    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::Switch, self.name());
        snapshot.state = self
            .is_on()
            .map_or(EntityState::Unknown, EntityState::from_bool);
        snapshot.set_attribute("device_class", self.device_class.as_str());
        if let Some(power) = self.current_power_w() {
            snapshot.set_attribute("current_power_w", power);
        }
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        _data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            let handle = &self.base.handle;
            match service {
                "turn_on" => handle.set_value_by_id(self.on_off, 1.0).await,
                "turn_off" => handle.set_value_by_id(self.on_off, 0.0).await,
                "toggle" => {
                    let target = if self.is_on().unwrap_or(false) { 0.0 } else { 1.0 };
                    handle.set_value_by_id(self.on_off, target).await
                }
                other => Err(unsupported(other, Platform::Switch)),
            }
        })
    }
}

/// One switch per ON_OFF attribute of every imported plug or switch node.
#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeSwitch> {
    let mut switches = Vec::new();
    for shared in &ctx.nodes {
        let node = read_node(shared);
        if !is_switch_node(&node) {
            continue;
        }
        let device_class = switch_device_class(node.profile);
        for (index, attribute) in node.attributes_of_type(AttributeType::ON_OFF).enumerate() {
            let unique_id = format!("{}-switch-{}", node.id, attribute.id);
            let name = switch_name(&node.name, &attribute.name, index);
            tracing::debug!(node = %node.id, attribute = %attribute.id, %name, "discovered switch");
            switches.push(HomeeSwitch::new(
                ctx.base(shared, unique_id),
                attribute.id,
                name,
                device_class,
            ));
        }
    }
    switches
}
