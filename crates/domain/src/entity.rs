//! Entity — a host-facing view of one controllable or observable aspect of a
//! hub node.
//!
//! Entities are synthesized by the classifiers in the `app` crate; this module
//! only defines the data they publish to the host.

mod attribute_value;
mod device_class;
mod state;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

pub use attribute_value::AttributeValue;
pub use device_class::{
    BinarySensorDeviceClass, CoverDeviceClass, HvacMode, SensorDeviceClass, StateClass,
    SwitchDeviceClass, TemperatureUnit,
};
pub use state::EntityState;

/// Host component kind an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Light,
    Cover,
    Switch,
    Sensor,
    BinarySensor,
    Climate,
}

impl Platform {
    /// Every platform, in the order they are set up.
    pub const ALL: [Self; 6] = [
        Self::Light,
        Self::Cover,
        Self::Switch,
        Self::Sensor,
        Self::BinarySensor,
        Self::Climate,
    ];

    /// Host component name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Cover => "cover",
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::BinarySensor => "binary_sensor",
            Self::Climate => "climate",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time state of an entity as published to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub unique_id: String,
    pub platform: Platform,
    /// `None` means the entity takes its device's name.
    pub name: Option<String>,
    pub node_id: NodeId,
    pub available: bool,
    pub state: EntityState,
    /// Platform-specific attributes (brightness, position, device class, …).
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl EntitySnapshot {
    /// Start a snapshot with an empty attribute map.
    #[must_use]
    pub fn new(unique_id: impl Into<String>, platform: Platform, node_id: NodeId) -> Self {
        Self {
            unique_id: unique_id.into(),
            platform,
            name: None,
            node_id,
            available: true,
            state: EntityState::Unknown,
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Host-style entity id, e.g. `light.12_light_3`.
    #[must_use]
    pub fn entity_id(&self) -> String {
        let slug: String = self
            .unique_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("{}.{slug}", self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_platform_as_snake_case() {
        let json = serde_json::to_string(&Platform::BinarySensor).unwrap();
        assert_eq!(json, "\"binary_sensor\"");
    }

    #[test]
    fn should_display_platform_as_component_name() {
        assert_eq!(Platform::Climate.to_string(), "climate");
        assert_eq!(Platform::ALL.len(), 6);
    }

    #[test]
    fn should_start_snapshot_unknown_and_available() {
        let snapshot = EntitySnapshot::new("1-cover", Platform::Cover, NodeId(1));
        assert_eq!(snapshot.state, EntityState::Unknown);
        assert!(snapshot.available);
        assert!(snapshot.name.is_none());
    }

    #[test]
    fn should_set_and_get_attribute() {
        let mut snapshot = EntitySnapshot::new("1-cover", Platform::Cover, NodeId(1));
        snapshot.set_attribute("current_position", 40_i64);
        assert_eq!(
            snapshot.get_attribute("current_position"),
            Some(&AttributeValue::Int(40))
        );
    }

    #[test]
    fn should_derive_entity_id_from_unique_id() {
        let snapshot = EntitySnapshot::new("12-light-3", Platform::Light, NodeId(12));
        assert_eq!(snapshot.entity_id(), "light.12_light_3");
    }
}
