//! Config entries — one per configured hub.
//!
//! Persisting entries is the host's job; this module only models what an
//! entry holds and the options that steer classification.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ValidationError};
use crate::id::{ConfigEntryId, GroupId};
use crate::transform::MiredRange;

/// Credentials and address of a hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionData {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Hub id learned through discovery, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homee_id: Option<String>,
}

/// How attributes of a multi-channel light are grouped into entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightGrouping {
    /// Bind the light attributes whose ids directly follow the on/off
    /// attribute.
    #[default]
    ContiguousIds,
    /// Bind the light attributes sharing the on/off attribute's instance.
    Instance,
}

/// User-adjustable options of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryOptions {
    /// Groups whose nodes are imported; `None` imports every group.
    pub groups: Option<Vec<GroupId>>,
    /// Binary sensors in these groups are reported as windows.
    pub window_groups: Vec<GroupId>,
    /// Binary sensors in these groups are reported as doors.
    pub door_groups: Vec<GroupId>,
    /// Expose the raw node and attribute data as extra state attributes.
    pub add_homee_data: bool,
    pub light_grouping: LightGrouping,
    pub mired_range: MiredRange,
}

/// A configured hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: ConfigEntryId,
    pub title: String,
    pub data: ConnectionData,
    #[serde(default)]
    pub options: EntryOptions,
}

impl ConfigEntry {
    /// Create a builder for constructing a [`ConfigEntry`].
    #[must_use]
    pub fn builder() -> ConfigEntryBuilder {
        ConfigEntryBuilder::default()
    }

    /// Id used to deduplicate discovered hubs: the homee id when known,
    /// otherwise the host.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        self.data.homee_id.as_deref().unwrap_or(&self.data.host)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `host` is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.data.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`ConfigEntry`].
#[derive(Debug, Default)]
pub struct ConfigEntryBuilder {
    id: Option<ConfigEntryId>,
    title: Option<String>,
    data: ConnectionData,
    options: EntryOptions,
}

impl ConfigEntryBuilder {
    #[must_use]
    pub fn id(mut self, id: ConfigEntryId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.data.host = host.into();
        self
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.data.username = username.into();
        self.data.password = password.into();
        self
    }

    #[must_use]
    pub fn homee_id(mut self, homee_id: impl Into<String>) -> Self {
        self.data.homee_id = Some(homee_id.into());
        self
    }

    #[must_use]
    pub fn options(mut self, options: EntryOptions) -> Self {
        self.options = options;
        self
    }

    /// Consume the builder, validate, and return a [`ConfigEntry`].
    ///
    /// The title defaults to `homee cube at {host}`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if `host` is missing or empty.
    pub fn build(self) -> Result<ConfigEntry, BridgeError> {
        let title = self
            .title
            .unwrap_or_else(|| format!("homee cube at {}", self.data.host));
        let entry = ConfigEntry {
            id: self.id.unwrap_or_default(),
            title,
            data: self.data,
            options: self.options,
        };
        entry.validate()?;
        Ok(entry)
    }
}
