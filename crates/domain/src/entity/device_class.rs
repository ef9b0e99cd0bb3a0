//! Device classes, state classes and units understood by the host.

use serde::{Deserialize, Serialize};

macro_rules! host_enum {
    (
        $(#[doc = $doc:expr])*
        $name:ident { $( $variant:ident => $text:literal, )* }
    ) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            /// Host identifier of the value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

host_enum!(
    /// What a binary sensor detects.
    BinarySensorDeviceClass {
        Opening => "opening",
        Plug => "plug",
        Lock => "lock",
        Window => "window",
        Door => "door",
    }
);

host_enum!(
    /// Physical kind of a cover.
    CoverDeviceClass {
        Garage => "garage",
        Shutter => "shutter",
    }
);

host_enum!(
    /// Physical kind of a switch.
    SwitchDeviceClass {
        Outlet => "outlet",
        Switch => "switch",
    }
);

host_enum!(
    /// Quantity a sensor measures.
    SensorDeviceClass {
        Power => "power",
        Energy => "energy",
    }
);

host_enum!(
    /// How a sensor's value evolves over time.
    StateClass {
        Measurement => "measurement",
        TotalIncreasing => "total_increasing",
    }
);

host_enum!(
    /// Operating mode of a climate entity.
    HvacMode {
        Heat => "heat",
    }
);

host_enum!(
    /// Temperature unit of a climate entity.
    TemperatureUnit {
        Celsius => "°C",
        Fahrenheit => "°F",
    }
);

impl TemperatureUnit {
    /// Map a (percent-decoded) hub unit string.
    #[must_use]
    pub fn from_hub_unit(unit: &str) -> Option<Self> {
        match unit.trim() {
            "°C" => Some(Self::Celsius),
            "°F" => Some(Self::Fahrenheit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_host_identifier() {
        assert_eq!(BinarySensorDeviceClass::Lock.to_string(), "lock");
        assert_eq!(StateClass::TotalIncreasing.to_string(), "total_increasing");
    }

    #[test]
    fn should_map_hub_temperature_units() {
        assert_eq!(
            TemperatureUnit::from_hub_unit("°C"),
            Some(TemperatureUnit::Celsius)
        );
        assert_eq!(
            TemperatureUnit::from_hub_unit("°F"),
            Some(TemperatureUnit::Fahrenheit)
        );
        assert_eq!(TemperatureUnit::from_hub_unit("K"), None);
    }

    #[test]
    fn should_serialize_as_snake_case() {
        let json = serde_json::to_string(&SwitchDeviceClass::Outlet).unwrap();
        assert_eq!(json, "\"outlet\"");
    }
}
