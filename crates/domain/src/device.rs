//! Device registry entries — the hub itself and the nodes behind it.

use serde::{Deserialize, Serialize};

use crate::DOMAIN;
use crate::error::{BridgeError, ValidationError};
use crate::hub::HubSettings;
use crate::node::Node;

/// Manufacturer reported for the hub and every node.
pub const MANUFACTURER: &str = "homee";

/// Model reported for the hub.
pub const HUB_MODEL: &str = "homee";

/// `(domain, id)` pair identifying a device in the host registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    pub domain: String,
    pub id: String,
}

impl DeviceIdentifier {
    /// An identifier in this integration's domain.
    #[must_use]
    pub fn homee(id: impl Into<String>) -> Self {
        Self {
            domain: DOMAIN.to_string(),
            id: id.into(),
        }
    }
}

/// A network connection the host can use to correlate devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Connection kind, e.g. `"mac"`.
    pub kind: String,
    pub value: String,
}

/// Registry entry of the hub itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubDevice {
    pub identifier: DeviceIdentifier,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: Option<String>,
    pub connections: Vec<Connection>,
}

impl HubDevice {
    /// Create a builder for constructing a [`HubDevice`].
    #[must_use]
    pub fn builder() -> HubDeviceBuilder {
        HubDeviceBuilder::default()
    }

    /// Build the entry from the settings the hub reported.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when the hub reported no name.
    pub fn from_settings(homee_id: &str, settings: &HubSettings) -> Result<Self, BridgeError> {
        let mut builder = Self::builder()
            .identifier(homee_id)
            .name(settings.homee_name.clone());
        if !settings.version.is_empty() {
            builder = builder.sw_version(settings.version.clone());
        }
        if !settings.mac_address.is_empty() {
            builder = builder.mac(&settings.mac_address);
        }
        builder.build()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`HubDevice`].
#[derive(Debug, Default)]
pub struct HubDeviceBuilder {
    identifier: Option<String>,
    name: Option<String>,
    sw_version: Option<String>,
    connections: Vec<Connection>,
}

impl HubDeviceBuilder {
    #[must_use]
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn sw_version(mut self, version: impl Into<String>) -> Self {
        self.sw_version = Some(version.into());
        self
    }

    /// Add a MAC connection; the address is normalised with [`format_mac`].
    #[must_use]
    pub fn mac(mut self, mac: &str) -> Self {
        self.connections.push(Connection {
            kind: "mac".to_string(),
            value: format_mac(mac),
        });
        self
    }

    /// Consume the builder, validate, and return a [`HubDevice`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<HubDevice, BridgeError> {
        let name = self.name.unwrap_or_default();
        let device = HubDevice {
            identifier: DeviceIdentifier::homee(self.identifier.unwrap_or_else(|| name.clone())),
            name,
            manufacturer: MANUFACTURER.to_string(),
            model: HUB_MODEL.to_string(),
            sw_version: self.sw_version,
            connections: self.connections,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Registry information attached to every entity of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifier: DeviceIdentifier,
    pub name: String,
    pub manufacturer: String,
    /// Profile name of the node, when known.
    pub model: Option<String>,
    /// The hub the node is reached through.
    pub via_device: Option<DeviceIdentifier>,
}

impl DeviceInfo {
    /// Device information for `node`, optionally linked to its hub.
    #[must_use]
    pub fn for_node(node: &Node, hub: Option<&DeviceIdentifier>) -> Self {
        Self {
            identifier: DeviceIdentifier::homee(node.id.to_string()),
            name: node.name.clone(),
            manufacturer: MANUFACTURER.to_string(),
            model: node.profile.name().map(str::to_string),
            via_device: hub.cloned(),
        }
    }
}

/// Normalise a MAC address to lowercase, colon-separated pairs.
///
/// Inputs that are not 12 hex digits (after stripping `:`, `-` and `.`) are
/// returned lowercased but otherwise untouched.
#[must_use]
pub fn format_mac(mac: &str) -> String {
    let hex: String = mac
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return mac.to_ascii_lowercase();
    }
    hex.as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .collect::<Vec<_>>()
        .join(":")
}
