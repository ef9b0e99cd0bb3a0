//! Entity state — the primary value an entity reports to the host.

use serde::{Deserialize, Serialize};

/// Primary state of an entity.
///
/// Sensors report a bare number; every other platform reports one of the
/// named states.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    Open,
    Opening,
    Closed,
    Closing,
    Heat,
    #[default]
    Unknown,
    Unavailable,
    #[serde(untagged)]
    Value(f64),
}

impl EntityState {
    /// Whether the entity is reachable (anything but [`Unavailable`](Self::Unavailable)).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    /// `On` for `true`, `Off` for `false`.
    #[must_use]
    pub fn from_bool(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Open => f.write_str("open"),
            Self::Opening => f.write_str("opening"),
            Self::Closed => f.write_str("closed"),
            Self::Closing => f.write_str("closing"),
            Self::Heat => f.write_str("heat"),
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::Value(v) => v.fmt(f),
        }
    }
}
