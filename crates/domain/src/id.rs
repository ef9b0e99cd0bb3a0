//! Typed identifier newtypes.
//!
//! Hub objects carry the numeric ids assigned by the hub; config entries are
//! created on this side and use random UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_hub_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Access the raw hub-assigned number.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_hub_id!(
    /// Hub-assigned identifier of a [`Node`](crate::node::Node).
    NodeId
);

define_hub_id!(
    /// Hub-assigned identifier of an [`Attribute`](crate::node::Attribute),
    /// unique within its node.
    AttributeId
);

define_hub_id!(
    /// Hub-assigned identifier of a [`Group`](crate::node::Group).
    GroupId
);

/// Unique identifier for a [`ConfigEntry`](crate::config_entry::ConfigEntry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigEntryId(uuid::Uuid);

impl Default for ConfigEntryId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ConfigEntryId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for ConfigEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConfigEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}
