//! Capability bitmasks advertised by entities.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Colour modes a light supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ColorModes: u8 {
        /// Plain on/off, used when nothing else applies.
        const ONOFF = 1 << 0;
        const BRIGHTNESS = 1 << 1;
        /// Hue/saturation through a packed colour or hue attribute.
        const HS = 1 << 2;
        const COLOR_TEMP = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Commands a cover accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CoverFeatures: u8 {
        const OPEN = 1 << 0;
        const CLOSE = 1 << 1;
        const STOP = 1 << 2;
        const SET_POSITION = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Setpoints a climate entity exposes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ClimateFeatures: u8 {
        const TARGET_TEMPERATURE = 1 << 0;
        /// Both a low and a high setpoint are present.
        const TARGET_TEMPERATURE_RANGE = 1 << 1;
    }
}

/// Lowercase flag names, in bit order, for host-facing snapshots.
#[must_use]
pub fn flag_names<F: bitflags::Flags>(flags: &F) -> Vec<String> {
    flags
        .iter_names()
        .map(|(name, _)| name.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_list_lowercase_flag_names() {
        let modes = ColorModes::BRIGHTNESS | ColorModes::HS;
        assert_eq!(flag_names(&modes), vec!["brightness", "hs"]);
    }

    #[test]
    fn should_list_no_names_for_empty_set() {
        assert!(flag_names(&CoverFeatures::empty()).is_empty());
    }

    #[test]
    fn should_combine_cover_features() {
        let features = CoverFeatures::OPEN | CoverFeatures::CLOSE | CoverFeatures::STOP;
        assert!(features.contains(CoverFeatures::STOP));
        assert!(!features.contains(CoverFeatures::SET_POSITION));
    }
}
