//! Light platform.
//!
//! A node becomes one light per editable ON_OFF attribute. Each light binds the
//! dimmer and colour attributes that belong to its channel, found with the
//! entry's [`LightGrouping`] heuristic.

use homee_bridge_domain::attribute_type::AttributeType;
use homee_bridge_domain::config_entry::LightGrouping;
use homee_bridge_domain::entity::{EntitySnapshot, EntityState, Platform};
use homee_bridge_domain::error::{BridgeError, ValidationError};
use homee_bridge_domain::features::{ColorModes, flag_names};
use homee_bridge_domain::id::AttributeId;
use homee_bridge_domain::node::{Attribute, Node, read_node};
use homee_bridge_domain::profile::NodeProfile;
use homee_bridge_domain::transform::{
    MiredRange, brightness_to_hub, hs_to_rgb, hub_to_brightness, rgb_to_hs, rgb_to_int,
    value_to_rgb,
};
use serde_json::Value;

use crate::discovery::DiscoveryContext;
use crate::entity::{EntityBase, HomeeEntity, unsupported};
use crate::service_registry::BoxFuture;

/// Profiles that may carry lights.
pub const LIGHT_PROFILES: &[NodeProfile] = &[
    NodeProfile::DIMMABLE_LIGHT,
    NodeProfile::DIMMABLE_COLOR_LIGHT,
    NodeProfile::DIMMABLE_EXTENDED_COLOR_LIGHT,
    NodeProfile::DIMMABLE_COLOR_TEMPERATURE_LIGHT,
    NodeProfile::DIMMABLE_LIGHT_WITH_BRIGHTNESS_SENSOR,
    NodeProfile::DIMMABLE_LIGHT_WITH_BRIGHTNESS_AND_PRESENCE_SENSOR,
    NodeProfile::DIMMABLE_LIGHT_WITH_PRESENCE_SENSOR,
    NodeProfile::DIMMABLE_RGBWLIGHT,
    NodeProfile::DIMMABLE_PLUG,
    NodeProfile::DIMMABLE_SWITCH,
    NodeProfile::DIMMABLE_METERING_SWITCH,
    NodeProfile::DIMMABLE_METERING_PLUG,
];

/// Attribute types that belong to a light channel besides ON_OFF.
pub const LIGHT_ATTRIBUTES: &[AttributeType] = &[
    AttributeType::DIMMING_LEVEL,
    AttributeType::COLOR,
    AttributeType::HUE,
    AttributeType::COLOR_TEMPERATURE,
    AttributeType::COLOR_MODE,
];

/// Colour-mode attribute value meaning "colour temperature".
const COLOR_MODE_TEMPERATURE: f64 = 2.0;

/// Whether `node` has a light profile and an ON_OFF attribute.
#[must_use]
pub fn is_light_node(node: &Node) -> bool {
    LIGHT_PROFILES.contains(&node.profile) && node.has_attribute(AttributeType::ON_OFF)
}

/// Attributes bound to one light channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightAttributeSet {
    pub on_off: AttributeId,
    pub dimmer: Option<AttributeId>,
    pub color: Option<AttributeId>,
    pub hue: Option<AttributeId>,
    pub color_temperature: Option<AttributeId>,
    pub color_mode: Option<AttributeId>,
}

impl LightAttributeSet {
    fn new(on_off: AttributeId) -> Self {
        Self {
            on_off,
            dimmer: None,
            color: None,
            hue: None,
            color_temperature: None,
            color_mode: None,
        }
    }

    fn bind(&mut self, attribute: &Attribute) {
        let slot = match attribute.attribute_type {
            AttributeType::DIMMING_LEVEL => &mut self.dimmer,
            AttributeType::COLOR => &mut self.color,
            AttributeType::HUE => &mut self.hue,
            AttributeType::COLOR_TEMPERATURE => &mut self.color_temperature,
            AttributeType::COLOR_MODE => &mut self.color_mode,
            _ => return,
        };
        *slot = Some(attribute.id);
    }

    /// Colour modes offered by the bound attributes.
    #[must_use]
    pub fn color_modes(&self) -> ColorModes {
        let mut modes = ColorModes::empty();
        if self.dimmer.is_some() {
            modes |= ColorModes::BRIGHTNESS;
        }
        if self.color.is_some() || self.hue.is_some() {
            modes |= ColorModes::HS;
        }
        if self.color_temperature.is_some() {
            modes |= ColorModes::COLOR_TEMP;
        }
        if modes.is_empty() {
            modes = ColorModes::ONOFF;
        }
        modes
    }
}

/// One attribute set per editable ON_OFF attribute, in attribute order.
#[must_use]
pub fn light_attribute_sets(node: &Node, grouping: LightGrouping) -> Vec<LightAttributeSet> {
    node.attributes
        .iter()
        .filter(|a| a.attribute_type == AttributeType::ON_OFF && a.editable)
        .map(|on_off| {
            let mut set = LightAttributeSet::new(on_off.id);
            match grouping {
                LightGrouping::ContiguousIds => {
                    let mut next = on_off.id.get();
                    loop {
                        let Some(id) = next.checked_add(1) else {
                            break;
                        };
                        next = id;
                        let Some(attribute) = node.attribute_by_id(AttributeId(next)) else {
                            break;
                        };
                        if !LIGHT_ATTRIBUTES.contains(&attribute.attribute_type) {
                            break;
                        }
                        set.bind(attribute);
                    }
                }
                LightGrouping::Instance => {
                    for attribute in node.attributes.iter().filter(|a| {
                        a.instance == on_off.instance
                            && LIGHT_ATTRIBUTES.contains(&a.attribute_type)
                    }) {
                        set.bind(attribute);
                    }
                }
            }
            set
        })
        .collect()
}

/// A single light channel of a node.
#[derive(Debug)]
pub struct HomeeLight {
    base: EntityBase,
    set: LightAttributeSet,
    index: usize,
    mireds: MiredRange,
    modes: ColorModes,
}

impl HomeeLight {
    #[must_use]
    pub fn new(base: EntityBase, set: LightAttributeSet, index: usize, mireds: MiredRange) -> Self {
        Self {
            base,
            set,
            index,
            mireds,
            modes: set.color_modes(),
        }
    }

    #[must_use]
    pub fn attribute_set(&self) -> &LightAttributeSet {
        &self.set
    }

    #[must_use]
    pub fn color_modes(&self) -> ColorModes {
        self.modes
    }

    fn value(node: &Node, id: Option<AttributeId>) -> Option<f64> {
        id.and_then(|id| node.attribute_by_id(id))
            .map(|a| a.current_value)
    }

    async fn turn_on(&self, data: &Value) -> Result<(), BridgeError> {
        let handle = &self.base.handle;
        handle.set_value_by_id(self.set.on_off, 1.0).await?;

        if let (Some(brightness), Some(dimmer)) = (read_u8(data, "brightness")?, self.set.dimmer) {
            handle
                .set_value_by_id(dimmer, brightness_to_hub(brightness))
                .await?;
        }

        if let (Some(mired), Some(temperature)) =
            (read_f64(data, "color_temp")?, self.set.color_temperature)
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let kelvin = self.mireds.mired_to_kelvin(mired.max(0.0).round() as u32);
            handle
                .set_value_by_id(temperature, f64::from(kelvin))
                .await?;
        }

        if let Some((hue, saturation)) = read_hs(data)? {
            if let Some(color) = self.set.color {
                let packed = rgb_to_int(hs_to_rgb(hue, saturation));
                handle.set_value_by_id(color, f64::from(packed)).await?;
            } else if let Some(hue_attribute) = self.set.hue {
                handle.set_value_by_id(hue_attribute, hue).await?;
            } else {
                return Err(ValidationError::UnsupportedFeature { feature: "hs_color" }.into());
            }
        }
        Ok(())
    }

    fn is_on(&self) -> bool {
        let node = self.base.handle.read();
        Self::value(&node, Some(self.set.on_off)).is_some_and(|v| v != 0.0)
    }
}

impl HomeeEntity for HomeeLight {
    fn platform(&self) -> Platform {
        Platform::Light
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn name(&self) -> Option<String> {
        if self.index == 0 {
            None
        } else {
            Some(format!("light {}", self.index + 1))
        }
    }

    fn snapshot(&self) -> EntitySnapshot {
        let mut snapshot = self.base.snapshot(Platform::Light, self.name());
        let node = self.base.handle.read();

        snapshot.state = Self::value(&node, Some(self.set.on_off))
            .map_or(EntityState::Unknown, |v| EntityState::from_bool(v != 0.0));
        snapshot.set_attribute("supported_color_modes", flag_names(&self.modes));

        if let Some(level) = Self::value(&node, self.set.dimmer) {
            snapshot.set_attribute("brightness", hub_to_brightness(level));
        }

        let temperature_mode =
            Self::value(&node, self.set.color_mode).is_some_and(|m| m == COLOR_MODE_TEMPERATURE);
        if !temperature_mode {
            let hs = Self::value(&node, self.set.color)
                .map(|packed| rgb_to_hs(value_to_rgb(packed)))
                .or_else(|| Self::value(&node, self.set.hue).map(|hue| (hue, 100.0)));
            if let Some((hue, saturation)) = hs {
                snapshot.set_attribute(
                    "hs_color",
                    Value::from(vec![Value::from(hue), Value::from(saturation)]),
                );
            }
        }

        if let Some(kelvin) = Self::value(&node, self.set.color_temperature) {
            snapshot.set_attribute("color_temp", self.mireds.kelvin_to_mired(kelvin));
            snapshot.set_attribute("min_mireds", self.mireds.min);
            snapshot.set_attribute("max_mireds", self.mireds.max);
        }

        let mode = if temperature_mode && self.modes.contains(ColorModes::COLOR_TEMP) {
            "color_temp"
        } else if self.modes.contains(ColorModes::HS) {
            "hs"
        } else if self.modes.contains(ColorModes::COLOR_TEMP) {
            "color_temp"
        } else if self.modes.contains(ColorModes::BRIGHTNESS) {
            "brightness"
        } else {
            "onoff"
        };
        snapshot.set_attribute("color_mode", mode);
        snapshot
    }

    fn handle_service<'a>(
        &'a self,
        service: &'a str,
        data: &'a Value,
    ) -> BoxFuture<'a, Result<(), BridgeError>> {
        Box::pin(async move {
            match service {
                "turn_on" => self.turn_on(data).await,
                "turn_off" => self.base.handle.set_value_by_id(self.set.on_off, 0.0).await,
                "toggle" => {
                    let target = if self.is_on() { 0.0 } else { 1.0 };
                    self.base
                        .handle
                        .set_value_by_id(self.set.on_off, target)
                        .await
                }
                other => Err(unsupported(other, Platform::Light)),
            }
        })
    }
}

fn read_f64(data: &Value, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or(ValidationError::InvalidServiceField { field }),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_u8(data: &Value, field: &'static str) -> Result<Option<u8>, ValidationError> {
    Ok(read_f64(data, field)?.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

fn read_hs(data: &Value) -> Result<Option<(f64, f64)>, ValidationError> {
    let invalid = ValidationError::InvalidServiceField { field: "hs_color" };
    match data.get("hs_color") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(pair)) if pair.len() == 2 => {
            match (pair[0].as_f64(), pair[1].as_f64()) {
                (Some(h), Some(s)) => Ok(Some((h, s))),
                _ => Err(invalid),
            }
        }
        Some(_) => Err(invalid),
    }
}

/// Lights of every imported light node.
#[must_use]
pub fn discover(ctx: &DiscoveryContext) -> Vec<HomeeLight> {
    let mut lights = Vec::new();
    for shared in &ctx.nodes {
        let (node_id, sets) = {
            let node = read_node(shared);
            if !is_light_node(&node) {
                continue;
            }
            (node.id, light_attribute_sets(&node, ctx.options.light_grouping))
        };
        for (index, set) in sets.into_iter().enumerate() {
            let base = ctx.base(shared, format!("{node_id}-light-{}", set.on_off));
            tracing::debug!(node = %node_id, unique_id = %base.unique_id, "discovered light");
            lights.push(HomeeLight::new(base, set, index, ctx.options.mired_range));
        }
    }
    lights
}
