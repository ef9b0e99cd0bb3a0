//! Pure value transforms between hub scales and host scales.
//!
//! Hub attributes report positions in a device-declared `[min, max]` range,
//! colour temperatures in Kelvin, colours as packed 24-bit RGB integers and
//! dim levels as percentages. The host expects inverted 0–100 positions,
//! mireds, hue/saturation pairs and 0–255 brightness.

use serde::{Deserialize, Serialize};

/// Full-scale value of a host cover position.
pub const UI_POSITION_MAX: f64 = 100.0;

/// Full-scale host brightness; hub dim levels are percentages, so the
/// factor between the two is 2.55.
pub const BRIGHTNESS_MAX: f64 = 255.0;

/// Convert a hub position in `[min, max]` to the inverted host scale:
/// `min` maps to 100, `max` maps to 0.
///
/// A degenerate range (`max <= min`) maps everything to 0.
#[must_use]
pub fn hub_to_ui(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }
    let fraction = ((value - min) / span).clamp(0.0, 1.0);
    UI_POSITION_MAX - fraction * UI_POSITION_MAX
}

/// Convert an inverted host position (0–100) back to the hub's `[min, max]`
/// range, snapped to the attribute's step.
#[must_use]
pub fn ui_to_hub(ui: f64, min: f64, max: f64, step: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return min;
    }
    let fraction = ((UI_POSITION_MAX - ui) / UI_POSITION_MAX).clamp(0.0, 1.0);
    let raw = min + fraction * span;
    if step > 0.0 {
        (min + ((raw - min) / step).round() * step).clamp(min, max)
    } else {
        raw
    }
}

/// Mired bounds accepted by a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiredRange {
    pub min: u32,
    pub max: u32,
}

impl MiredRange {
    /// Coldest colour temperature homee lights accept (≈ 6536 K).
    pub const HOMEE_MIN: u32 = 153;
    /// Warmest colour temperature homee lights accept (≈ 1800 K).
    pub const HOMEE_MAX: u32 = 556;

    /// Clamp a mired value into the range.
    #[must_use]
    pub fn clamp(self, mired: u32) -> u32 {
        mired.clamp(self.min, self.max)
    }

    /// `mired = 1_000_000 / kelvin`, rounded and clamped.
    ///
    /// Non-positive Kelvin values clamp to the warm end.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn kelvin_to_mired(self, kelvin: f64) -> u32 {
        if kelvin <= 0.0 {
            return self.max;
        }
        let mired = (1_000_000.0 / kelvin).round();
        if mired >= f64::from(u32::MAX) {
            return self.max;
        }
        self.clamp(mired as u32)
    }

    /// Inverse of [`kelvin_to_mired`](Self::kelvin_to_mired); the input is
    /// clamped before conversion.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn mired_to_kelvin(self, mired: u32) -> u32 {
        let mired = self.clamp(mired).max(1);
        (1_000_000.0 / f64::from(mired)).round() as u32
    }
}

impl Default for MiredRange {
    fn default() -> Self {
        Self {
            min: Self::HOMEE_MIN,
            max: Self::HOMEE_MAX,
        }
    }
}

/// Pack `[r, g, b]` into a 24-bit integer, red in the highest byte.
#[must_use]
pub fn rgb_to_int(rgb: [u8; 3]) -> u32 {
    let [r, g, b] = rgb;
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Unpack a 24-bit integer into `[r, g, b]`. Bits above 24 are ignored.
#[must_use]
pub fn int_to_rgb(value: u32) -> [u8; 3] {
    let [_, r, g, b] = (value & 0x00FF_FFFF).to_be_bytes();
    [r, g, b]
}

/// Hub colour attributes carry the packed integer as a float.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn value_to_rgb(value: f64) -> [u8; 3] {
    int_to_rgb(value.max(0.0) as u32)
}

/// Hub dim level (0–100) to host brightness (0–255).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hub_to_brightness(level: f64) -> u8 {
    (level * BRIGHTNESS_MAX / 100.0).round().clamp(0.0, BRIGHTNESS_MAX) as u8
}

/// Host brightness (0–255) to hub dim level (0–100).
#[must_use]
pub fn brightness_to_hub(brightness: u8) -> f64 {
    f64::from(brightness) * 100.0 / BRIGHTNESS_MAX
}

/// RGB to `(hue 0–360, saturation 0–100)`, brightness discarded.
#[must_use]
pub fn rgb_to_hs(rgb: [u8; 3]) -> (f64, f64) {
    let [r, g, b] = rgb.map(|c| f64::from(c) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta <= f64::EPSILON {
        return (0.0, 0.0);
    }

    let saturation = delta / max;
    let sector = if (max - r).abs() <= f64::EPSILON {
        ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() <= f64::EPSILON {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (round3(sector * 60.0), round3(saturation * 100.0))
}

/// `(hue 0–360, saturation 0–100)` to fully bright RGB.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hs_to_rgb(hue: f64, saturation: f64) -> [u8; 3] {
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let h = hue.rem_euclid(360.0) / 60.0;
    let chroma = s;
    let x = chroma * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let m = 1.0 - chroma;

    let (r, g, b) = match h as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    [r, g, b].map(|c| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
