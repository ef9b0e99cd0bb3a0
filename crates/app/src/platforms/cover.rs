//! Cover platform — shutters, blinds and garage doors.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::entity::{CoverDeviceClass, EntitySnapshot, EntityState, Platform};
use homee_bridge_domain::error::{BridgeError, ValidationError};
use homee_bridge_domain::features::{CoverFeatures, flag_names};
use homee_bridge_domain::node::{Node, read_node};
use homee_bridge_domain::profile::NodeProfile;
use homee_bridge_domain::transform::{hub_to_ui, ui_to_hub};
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

pub const COVER_PROFILES: &[NodeProfile] = &[
    NodeProfile::ELECTRIC_MOTOR_METERING_SWITCH,
    NodeProfile::ELECTRIC_MOTOR_METERING_SWITCH_WITHOUT_SLAT_POSITION,
    NodeProfile::GARAGE_DOOR_OPERATOR,
    NodeProfile::SHUTTER_POSITION_SWITCH,
];

/// Movement command and state codes of UP_DOWN / OPEN_CLOSE attributes.
pub mod movement {
    pub const OPEN: f64 = 0.0;
    pub const CLOSE: f64 = 1.0;
    pub const STOP: f64 = 2.0;
    pub const OPENING: f64 = 3.0;
    pub const CLOSING: f64 = 4.0;
}

#[must_use]
pub fn is_cover_node(node: &Node) -> bool {
    COVER_PROFILES.contains(&node.profile)
}

/// Commands the node's editable attributes allow.
#[must_use]
pub fn cover_features(node: &Node) -> CoverFeatures {
    let mut features = CoverFeatures::empty();
    for attribute in node.attributes.iter().filter(|a| a.editable) {
        match attribute.attribute_type {
            AttributeType::UP_DOWN | AttributeType::OPEN_CLOSE => {
                features |= CoverFeatures::OPEN | CoverFeatures::CLOSE | CoverFeatures::STOP;
            }
            AttributeType::POSITION => features |= CoverFeatures::SET_POSITION,
            _ => {}
        }
    }
    features
}

#[must_use]
pub fn cover_device_class(profile: NodeProfile) -> Option<CoverDeviceClass> {
    match profile {
        NodeProfile::GARAGE_DOOR_OPERATOR => Some(CoverDeviceClass::Garage),
        NodeProfile::SHUTTER_POSITION_SWITCH => Some(CoverDeviceClass::Shutter),
        _ => None,
    }
}

/// Attribute type that carries movement commands: UP_DOWN when present,
/// OPEN_CLOSE otherwise.
#[must_use]
pub fn movement_attribute(node: &Node) -> AttributeType {
    if node.has_attribute(AttributeType::UP_DOWN) {
        AttributeType::UP_DOWN
    } else {
        AttributeType::OPEN_CLOSE
    }
}

#[derive(Debug)]
pub struct HomeeCover {
    base: EntityBase,
    features: CoverFeatures,
    device_class: Option<CoverDeviceClass>,
    movement: AttributeType,
}

impl HomeeCover {
    #[must_use]
    pub fn new(base: EntityBase, node: &Node) -> Self {
        Self {
            base,
            features: cover_features(node),
            device_class: cover_device_class(node.profile),
            movement: movement_attribute(node),
        }
    }

    #[must_use]
    pub fn features(&self) -> CoverFeatures {
        self.features
    }

    #[must_use]
    pub fn device_class(&self) -> Option<CoverDeviceClass> {
        self.device_class
    }

    /// Position on the host's 0–100 scale, if the node reports one.
    #[must_use]
    pub fn current_position(&self) -> Option<f64> {
        self.base
            .handle
            .attribute(AttributeType::POSITION)
            .ok()
            .map(|a| hub_to_ui(a.current_value, a.minimum, a.maximum).round())
    }

    async fn set_position(&self, data: &Value) -> Result<(), BridgeError> {
        if !self.features.contains(CoverFeatures::SET_POSITION) {
            return Err(ValidationError::UnsupportedFeature {
                feature: "set_cover_position",
            }
            .into());
        }
        let position = data
            .get("position")
            .and_then(Value::as_f64)
            .ok_or(ValidationError::InvalidServiceField { field: "position" })?;
        let attribute = self.base.handle.attribute(AttributeType::POSITION)?;
        let target = ui_to_hub(
            position.clamp(0.0, 100.0),
            attribute.minimum,
            attribute.maximum,
            attribute.step_value,
        );
        self.base.handle.set_value_by_id(attribute.id, target).await
    }
}

impl HomeeEntity for HomeeCover {
    fn platform(&self) -> Platform {
        Platform::Cover
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        None
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::Cover, None);
        let movement = self.base.handle.attribute_value(self.movement).ok();
        let position = self.current_position();

        snapshot.state = match (movement, position) {
            (Some(m), _) if m == movement::OPENING => EntityState::Opening,
            (Some(m), _) if m == movement::CLOSING => EntityState::Closing,
            (_, Some(p)) if p <= 0.0 => EntityState::Closed,
            (_, Some(_)) => EntityState::Open,
            (Some(m), None) if m == movement::CLOSE => EntityState::Closed,
            (Some(m), None) if m == movement::OPEN => EntityState::Open,
            _ => EntityState::Unknown,
        };

        if let Some(p) = position {
            snapshot.set_attribute("current_position", p);
        }
        snapshot.set_attribute("supported_features", flag_names(&self.features));
        if let Some(class) = self.device_class {
            snapshot.set_attribute("device_class", class.as_str());
        }
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            let handle = &self.base.handle;
            match service {
                "open_cover" => handle.set_value(self.movement, movement::OPEN).await,
                "close_cover" => handle.set_value(self.movement, movement::CLOSE).await,
                "stop_cover" => handle.set_value(self.movement, movement::STOP).await,
                "set_cover_position" => self.set_position(data).await,
                other => Err(unsupported(other, Platform::Cover)),
            }
        })
    }
}

/// One cover per imported cover node.
#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeCover> {
    ctx.nodes
        .iter()
        .filter_map(|shared| {
            let node = read_node(shared);
            if !is_cover_node(&node) {
                return None;
            }
            let base = ctx.base(shared, format!("{}-cover", node.id));
            tracing::debug!(node = %node.id, "discovered cover");
            Some(HomeeCover::new(base, &node))
        })
        .collect()
}
