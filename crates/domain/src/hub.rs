//! Hub-wide settings reported by the hub.

use serde::{Deserialize, Serialize};

/// Settings block of a full hub snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// User-facing name of the hub.
    pub homee_name: String,
    /// Firmware version.
    pub version: String,
    /// MAC address as reported, usually 12 bare hex digits.
    pub mac_address: String,
}
