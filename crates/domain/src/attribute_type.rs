//! Attribute types — what a single attribute of a node measures or controls.
//!
//! The display names used for default sensor naming come from the static
//! table generated here, never from runtime introspection.

use crate::macros::define_codes;

define_codes!(
    /// Numeric attribute type reported by the hub.
    AttributeType {
        NONE = 0,
        ON_OFF = 1,
        DIMMING_LEVEL = 2,
        CURRENT_ENERGY_USE = 3,
        ACCUMULATED_ENERGY_USE = 4,
        TEMPERATURE = 5,
        TARGET_TEMPERATURE = 6,
        RELATIVE_HUMIDITY = 7,
        BATTERY_LEVEL = 8,
        STATUS_LED = 9,
        WINDOW_POSITION = 10,
        BRIGHTNESS = 11,
        FLOOD_ALARM = 12,
        SIREN = 13,
        OPEN_CLOSE = 14,
        POSITION = 15,
        SMOKE_ALARM = 16,
        BLACKOUT_ALARM = 17,
        CURRENT_VALVE_POSITION = 18,
        BINARY_INPUT = 19,
        CO2_LEVEL = 20,
        PRESSURE = 21,
        COLOR = 23,
        SABOTAGE = 24,
        MOTION_ALARM = 25,
        CURRENT = 28,
        VOLTAGE = 29,
        POWER = 30,
        COLOR_TEMPERATURE = 42,
        SLAT_ROTATION_IMPULSE = 113,
        UP_DOWN = 135,
        LOCK_STATE = 232,
        HUE = 311,
        COLOR_MODE = 321,
        TARGET_TEMPERATURE_LOW = 331,
        TARGET_TEMPERATURE_HIGH = 332,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_name_known_attribute_type() {
        assert_eq!(
            AttributeType::CURRENT_ENERGY_USE.name(),
            Some("CURRENT_ENERGY_USE")
        );
    }

    #[test]
    fn should_display_unknown_type_with_code() {
        assert_eq!(AttributeType(4242).to_string(), "AttributeType(4242)");
    }

    #[test]
    fn should_convert_from_raw_code() {
        assert_eq!(AttributeType::from(135), AttributeType::UP_DOWN);
    }

    #[test]
    fn should_list_codes_without_duplicates() {
        let mut codes: Vec<u16> = AttributeType::ALL.iter().map(|t| t.code()).collect();
        let before = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), before);
    }
}
