//! Temperature-to-color mapping for the heat map.
//!
//! All color math lives here — no painting code should compute hues on its
//! own. The mapping is a fixed linear ramp from 19 °C (hue 240, blue) down
//! to 32 °C (hue 0, red) at full saturation and half lightness.
//!
//! The ramp is deliberately **unclamped**: temperatures below 19 °C produce
//! hues above 240 and temperatures above 32 °C produce negative hues. The
//! HSL conversion wraps hue modulo 360, so a 45 °C reading lands back in the
//! green band rather than saturating at red. This matches the observed
//! behavior of the reference viewer and is kept as-is; do not clamp.

/// Lower bound of the color ramp in degrees Celsius. Maps to hue 240.
pub const MIN_TEMP: f64 = 19.0;

/// Upper bound of the color ramp in degrees Celsius. Maps to hue 0.
pub const MAX_TEMP: f64 = 32.0;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Occupancy indicator color when a body is detected.
pub const OCCUPIED_COLOR: Rgb = Rgb {
    r: 0xef,
    g: 0x44,
    b: 0x44,
};

/// Occupancy indicator color when the view is clear.
pub const CLEAR_COLOR: Rgb = Rgb {
    r: 0x22,
    g: 0xc5,
    b: 0x5e,
};

// ---------------------------------------------------------------------------
// Temperature ramp
// ---------------------------------------------------------------------------

/// Hue in degrees for a temperature, per the linear ramp.
///
/// `hue = (1 - (t - 19) / (32 - 19)) * 240`. Exact at the bounds:
/// `hue_for(19.0) == 240.0` and `hue_for(32.0) == 0.0`. Out-of-range
/// temperatures extrapolate linearly; wrapping happens in [`hsl_to_rgb`],
/// not here.
pub fn hue_for(temp: f64) -> f64 {
    let normalized = (temp - MIN_TEMP) / (MAX_TEMP - MIN_TEMP);
    (1.0 - normalized) * 240.0
}

/// Color for a temperature cell: ramp hue at 100% saturation, 50% lightness.
pub fn color_for(temp: f64) -> Rgb {
    hsl_to_rgb(hue_for(temp), 1.0, 0.5)
}

/// Color for the binary occupancy indicator.
pub fn occupancy_color(occupied: bool) -> Rgb {
    if occupied { OCCUPIED_COLOR } else { CLEAR_COLOR }
}

// ---------------------------------------------------------------------------
// HSL conversion
// ---------------------------------------------------------------------------

/// Convert HSL to 8-bit RGB.
///
/// `h` is in degrees and is wrapped into [0, 360) with `rem_euclid`, so the
/// unclamped ramp hues (negative, or above 240) resolve to a valid color.
/// `s` and `l` are in [0, 1].
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let sector = h / 60.0;
    let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    Rgb {
        r: ((r1 + m) * 255.0).round() as u8,
        g: ((g1 + m) * 255.0).round() as u8,
        b: ((b1 + m) * 255.0).round() as u8,
    }
}
