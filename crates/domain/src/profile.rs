//! Node profiles — the hub's classification of a node's general device category.

use crate::macros::define_codes;

define_codes!(
    /// Numeric node profile reported by the hub.
    ///
    /// Unknown codes are representable; they simply match no classifier.
    NodeProfile {
        NONE = 0,
        HOMEE = 1,
        ON_OFF_PLUG = 10,
        DIMMABLE_METERING_SWITCH = 11,
        METERING_SWITCH = 12,
        METERING_PLUG = 13,
        DIMMABLE_PLUG = 14,
        DIMMABLE_SWITCH = 15,
        ON_OFF_SWITCH = 16,
        DOUBLE_ON_OFF_SWITCH = 18,
        DIMMABLE_METERING_PLUG = 19,
        DOUBLE_METERING_SWITCH = 20,
        DOUBLE_ON_OFF_PLUG = 21,
        IMPULSE_PLUG = 22,
        ON_OFF_SWITCH_WITH_BINARY_INPUT = 23,
        WATCHDOG_DEVICE = 24,
        DIMMABLE_COLOR_LIGHT = 1001,
        DIMMABLE_EXTENDED_COLOR_LIGHT = 1002,
        DIMMABLE_COLOR_TEMPERATURE_LIGHT = 1003,
        DIMMABLE_LIGHT = 1004,
        DIMMABLE_LIGHT_WITH_BRIGHTNESS_SENSOR = 1005,
        DIMMABLE_LIGHT_WITH_BRIGHTNESS_AND_PRESENCE_SENSOR = 1006,
        DIMMABLE_LIGHT_WITH_PRESENCE_SENSOR = 1007,
        DIMMABLE_RGBWLIGHT = 1008,
        OPEN_CLOSE_SENSOR = 2000,
        WINDOW_HANDLE = 2001,
        SHUTTER_POSITION_SWITCH = 2002,
        OPEN_CLOSE_AND_TEMPERATURE_SENSOR = 2003,
        ELECTRIC_MOTOR_METERING_SWITCH = 2004,
        OPEN_CLOSE_WITH_TEMPERATURE_AND_BRIGHTNESS_SENSOR = 2005,
        ELECTRIC_MOTOR_METERING_SWITCH_WITHOUT_SLAT_POSITION = 2006,
        LOCK = 2007,
        WINDOW_HANDLE_EXTENDED = 2008,
        GARAGE_DOOR_OPERATOR = 2012,
        TEMPERATURE_AND_HUMIDITY_SENSOR = 3001,
        CO2_SENSOR = 3002,
        ROOM_THERMOSTAT = 3003,
        ROOM_THERMOSTAT_WITH_HUMIDITY_SENSOR = 3004,
        BINARY_INPUT = 3005,
        RADIATOR_THERMOSTAT = 3006,
        TEMPERATURE_SENSOR = 3009,
        HUMIDITY_SENSOR = 3010,
        WATER_VALVE = 3011,
        WATER_METER = 3012,
        WEATHER_STATION = 3013,
        ENERGY_METER = 3016,
        THERMOSTAT_WITH_HEATING_AND_COOLING = 3023,
        HEATING_SYSTEM = 3035,
        BRIGHTNESS_SENSOR = 4001,
        MOTION_DETECTOR_WITH_TEMPERATURE_BRIGHTNESS_AND_HUMIDITY_SENSOR = 4002,
        MOTION_DETECTOR = 4010,
        SMOKE_DETECTOR = 4011,
        FLOOD_DETECTOR = 4012,
        PRESENCE_DETECTOR = 4013,
        SIREN = 4014,
        REMOTE_CONTROL = 5000,
        FOUR_BUTTON_REMOTE_CONTROL = 5010,
    }
);
