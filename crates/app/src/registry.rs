//! Entity registry — providers examine nodes and emit entity descriptors.
//!
//! The registry is rebuilt from scratch whenever the hub delivers a full node
//! snapshot. Every provider sees every node and all of their entries are kept.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::entity::Platform;
use homee_bridge_domain::id::NodeId;
use homee_bridge_domain::node::Node;
use homee_bridge_domain::profile::NodeProfile;
use serde::Serialize;
use serde_json::{Value, json};

use crate::platforms::{binary_sensor, climate, cover, sensor, switch};

/// Descriptor of an entity a provider wants created for a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityEntry {
    pub platform: Platform,
    pub node_id: NodeId,
    /// Provider-specific data, e.g. the bound attribute id.
    pub extra: Value,
}

impl EntityEntry {
    #[must_use]
    pub fn new(platform: Platform, node_id: NodeId) -> Self {
        Self {
            platform,
            node_id,
            extra: Value::Null,
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }
}

/// Turns a node into zero or more entity descriptors of one platform.
pub trait EntityProvider: Send + Sync {
    fn platform(&self) -> Platform;

    fn provide(&self, node: &Node) -> Vec<EntityEntry>;
}

/// Accumulated entity descriptors of all registered nodes.
pub struct EntityRegistry {
    providers: Vec<Box<dyn EntityProvider>>,
    entries: Vec<EntityEntry>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn EntityProvider>>) -> Self {
        Self {
            providers,
            entries: Vec::new(),
        }
    }

    /// Registry with a provider for every platform.
    #[must_use]
    pub fn with_default_providers() -> Self {
        Self::new(default_providers())
    }

    /// Run every provider on `node` and keep all of their entries.
    pub fn register(&mut self, node: &Node) {
        for provider in &self.providers {
            let entries = provider.provide(node);
            if !entries.is_empty() {
                tracing::trace!(
                    node = %node.id,
                    platform = %provider.platform(),
                    count = entries.len(),
                    "registered entries"
                );
            }
            self.entries.extend(entries);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries of one platform, in registration order.
    pub fn entries_for(&self, platform: Platform) -> impl Iterator<Item = &EntityEntry> {
        self.entries.iter().filter(move |e| e.platform == platform)
    }

    #[must_use]
    pub fn entries(&self) -> &[EntityEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("providers", &self.providers.len())
            .field("entries", &self.entries)
            .finish()
    }
}

/// Providers for all six platforms.
#[must_use]
pub fn default_providers() -> Vec<Box<dyn EntityProvider>> {
    vec![
        Box::new(LightProvider),
        Box::new(CoverProvider),
        Box::new(SwitchProvider),
        Box::new(SensorProvider),
        Box::new(BinarySensorProvider),
        Box::new(ClimateProvider),
    ]
}

/// Profiles that are lights without looking at attributes.
pub const EXPLICIT_LIGHT_PROFILES: &[NodeProfile] = &[
    NodeProfile::DIMMABLE_LIGHT,
    NodeProfile::DIMMABLE_COLOR_LIGHT,
    NodeProfile::DIMMABLE_EXTENDED_COLOR_LIGHT,
    NodeProfile::DIMMABLE_COLOR_TEMPERATURE_LIGHT,
    NodeProfile::DIMMABLE_LIGHT_WITH_BRIGHTNESS_SENSOR,
    NodeProfile::DIMMABLE_LIGHT_WITH_BRIGHTNESS_AND_PRESENCE_SENSOR,
    NodeProfile::DIMMABLE_LIGHT_WITH_PRESENCE_SENSOR,
];

/// A node is a light if its profile says so, or if it has a recognized
/// profile, can be switched and carries an editable brightness.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightProvider;

impl EntityProvider for LightProvider {
    fn platform(&self) -> Platform {
        Platform::Light
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        let explicit = EXPLICIT_LIGHT_PROFILES.contains(&node.profile);
        let dimmable = node.profile.is_known()
            && node.has_attribute(AttributeType::ON_OFF)
            && node
                .attributes_of_type(AttributeType::BRIGHTNESS)
                .any(|a| a.editable);
        if explicit || dimmable {
            vec![EntityEntry::new(Platform::Light, node.id)]
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverProvider;

impl EntityProvider for CoverProvider {
    fn platform(&self) -> Platform {
        Platform::Cover
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        if !cover::is_cover_node(node) {
            return Vec::new();
        }
        let features = homee_bridge_domain::features::flag_names(&cover::cover_features(node));
        vec![EntityEntry::new(Platform::Cover, node.id).with_extra(json!({ "features": features }))]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchProvider;

impl EntityProvider for SwitchProvider {
    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        if !switch::is_switch_node(node) {
            return Vec::new();
        }
        node.attributes_of_type(AttributeType::ON_OFF)
            .map(|a| {
                EntityEntry::new(Platform::Switch, node.id).with_extra(json!({ "attribute": a.id }))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SensorProvider;

impl EntityProvider for SensorProvider {
    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        if !node.profile.is_known() {
            return Vec::new();
        }
        node.attributes
            .iter()
            .filter(|a| sensor::is_sensor_attribute(a))
            .map(|a| {
                EntityEntry::new(Platform::Sensor, node.id).with_extra(json!({ "attribute": a.id }))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySensorProvider;

impl EntityProvider for BinarySensorProvider {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        if !binary_sensor::is_binary_sensor_node(node) {
            return Vec::new();
        }
        let (class, state_attribute) = binary_sensor::binary_sensor_class(node);
        vec![EntityEntry::new(Platform::BinarySensor, node.id).with_extra(json!({
            "device_class": class.as_str(),
            "state_attribute": state_attribute,
        }))]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClimateProvider;

impl EntityProvider for ClimateProvider {
    fn platform(&self) -> Platform {
        Platform::Climate
    }

    fn provide(&self, node: &Node) -> Vec<EntityEntry> {
        if climate::is_climate_node(node) {
            vec![EntityEntry::new(Platform::Climate, node.id)]
        } else {
            Vec::new()
        }
    }
}
