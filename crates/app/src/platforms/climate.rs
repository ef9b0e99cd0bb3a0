//! Climate platform — thermostats and heating systems.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::entity::{EntitySnapshot, EntityState, HvacMode, Platform, TemperatureUnit};
use homee_bridge_domain::error::{BridgeError, ValidationError};
use homee_bridge_domain::features::{ClimateFeatures, flag_names};
use homee_bridge_domain::node::{Node, read_node};
use homee_bridge_domain::profile::NodeProfile;
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

pub const CLIMATE_PROFILES: &[NodeProfile] = &[
    NodeProfile::RADIATOR_THERMOSTAT,
    NodeProfile::THERMOSTAT_WITH_HEATING_AND_COOLING,
    NodeProfile::HEATING_SYSTEM,
];

#[must_use]
pub fn is_climate_node(node: &Node) -> bool {
    CLIMATE_PROFILES.contains(&node.profile)
}

#[must_use]
pub fn climate_features(node: &Node) -> ClimateFeatures {
    let mut features = ClimateFeatures::empty();
    if node.has_attribute(AttributeType::TARGET_TEMPERATURE) {
        features |= ClimateFeatures::TARGET_TEMPERATURE;
    }
    if node.has_attribute(AttributeType::TARGET_TEMPERATURE_LOW)
        && node.has_attribute(AttributeType::TARGET_TEMPERATURE_HIGH)
    {
        features |= ClimateFeatures::TARGET_TEMPERATURE_RANGE;
    }
    features
}

/// Unit of the node's temperature readings, Celsius when unreported.
#[must_use]
pub fn temperature_unit(node: &Node) -> TemperatureUnit {
    [AttributeType::TEMPERATURE, AttributeType::TARGET_TEMPERATURE]
        .into_iter()
        .filter_map(|t| node.attribute_by_type(t))
        .find_map(|a| TemperatureUnit::from_hub_unit(&a.unit))
        .unwrap_or(TemperatureUnit::Celsius)
}

#[derive(Debug)]
pub struct HomeeClimate {
    base: EntityBase,
    features: ClimateFeatures,
    unit: TemperatureUnit,
}

impl HomeeClimate {
    #[must_use]
    pub fn new(base: EntityBase, node: &Node) -> Self {
        Self {
            base,
            features: climate_features(node),
            unit: temperature_unit(node),
        }
    }

    #[must_use]
    pub fn features(&self) -> ClimateFeatures {
        self.features
    }

    #[must_use]
    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    fn field(data: &Value, field: &'static str) -> Result<Option<f64>, BridgeError> {
        match data.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| ValidationError::InvalidServiceField { field }.into()),
        }
    }

    async fn set_temperature(&self, data: &Value) -> Result<(), BridgeError> {
        let handle = &self.base.handle;
        if let Some(temperature) = Self::field(data, "temperature")? {
            handle
                .set_value(AttributeType::TARGET_TEMPERATURE, temperature)
                .await?;
        }
        if self.features.contains(ClimateFeatures::TARGET_TEMPERATURE_RANGE) {
            if let Some(low) = Self::field(data, "target_temp_low")? {
                handle
                    .set_value(AttributeType::TARGET_TEMPERATURE_LOW, low)
                    .await?;
            }
            if let Some(high) = Self::field(data, "target_temp_high")? {
                handle
                    .set_value(AttributeType::TARGET_TEMPERATURE_HIGH, high)
                    .await?;
            }
        }
        Ok(())
    }
}

impl HomeeEntity for HomeeClimate {
    fn platform(&self) -> Platform {
        Platform::Climate
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        None
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::Climate, None);
        let node = self.base.handle.read();
        snapshot.state = EntityState::Heat;
        snapshot.set_attribute("hvac_modes", vec![HvacMode::Heat.as_str().to_string()]);
        snapshot.set_attribute("temperature_unit", self.unit.as_str());
        snapshot.set_attribute("supported_features", flag_names(&self.features));
        if let Ok(current) = node.value(AttributeType::TEMPERATURE) {
            snapshot.set_attribute("current_temperature", current);
        }
        if let Some(target) = node.attribute_by_type(AttributeType::TARGET_TEMPERATURE) {
            snapshot.set_attribute("temperature", target.current_value);
            snapshot.set_attribute("target_temp_step", target.step_value);
            snapshot.set_attribute("min_temp", target.minimum);
            snapshot.set_attribute("max_temp", target.maximum);
        }
        if self.features.contains(ClimateFeatures::TARGET_TEMPERATURE_RANGE) {
            if let Ok(low) = node.value(AttributeType::TARGET_TEMPERATURE_LOW) {
                snapshot.set_attribute("target_temp_low", low);
            }
            if let Ok(high) = node.value(AttributeType::TARGET_TEMPERATURE_HIGH) {
                snapshot.set_attribute("target_temp_high", high);
            }
        }
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            match service {
                "set_temperature" => self.set_temperature(data).await,
                "set_hvac_mode" => match data.get("hvac_mode").and_then(Value::as_str) {
                    Some(mode) if mode == HvacMode::Heat.as_str() => Ok(()),
                    _ => Err(ValidationError::UnsupportedFeature {
                        feature: "hvac_mode",
                    }
                    .into()),
                },
                other => Err(unsupported(other, Platform::Climate)),
            }
        })
    }
}

/// One climate entity per imported thermostat node.
#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeClimate> {
    ctx.nodes
        .iter()
        .filter_map(|shared| {
            let node = read_node(shared);
            if !is_climate_node(&node) {
                return None;
            }
            tracing::debug!(node = %node.id, "discovered climate");
            Some(HomeeClimate::new(
                ctx.base(shared, format!("{}-climate", node.id)),
                &node,
            ))
        })
        .collect()
}
