//! Colour spaces and colour values.
//!
//! Components are kept as floats in `[0, 1]`; conversion to RGB happens only
//! when a rasterizer needs pixel values.

use serde::{Deserialize, Serialize};

use crate::utils::clamp01;

/// A colour space a fill or stroke colour is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    /// ICC profile based space; rendering goes through the declared alternate.
    ICCBased {
        components: usize,
        alternate: Option<Box<ColorSpace>>,
    },
    /// Pattern space, optionally with the underlying space of uncoloured patterns.
    Pattern { underlying: Option<Box<ColorSpace>> },
}

impl ColorSpace {
    /// Resolves one of the device family names (and their inline abbreviations).
    pub fn from_device_name(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "G" | "CalGray" => Some(Self::DeviceGray),
            "DeviceRGB" | "RGB" | "CalRGB" => Some(Self::DeviceRGB),
            "DeviceCMYK" | "CMYK" => Some(Self::DeviceCMYK),
            "Pattern" => Some(Self::Pattern { underlying: None }),
            _ => None,
        }
    }

    /// Number of colour components.
    pub fn ncomponents(&self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRGB => 3,
            Self::DeviceCMYK => 4,
            Self::ICCBased { components, .. } => *components,
            Self::Pattern { underlying } => underlying.as_ref().map_or(0, |cs| cs.ncomponents()),
        }
    }

    pub const fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// Initial colour value after selecting this space with `CS`/`cs`.
    pub fn initial_components(&self) -> Vec<f64> {
        match self {
            Self::DeviceCMYK => vec![0.0, 0.0, 0.0, 1.0],
            Self::ICCBased {
                alternate: Some(alt),
                ..
            } => alt.initial_components(),
            Self::ICCBased { components: 4, .. } => vec![0.0, 0.0, 0.0, 1.0],
            other => vec![0.0; other.ncomponents()],
        }
    }

    /// Converts components in this space to straight RGB in `[0, 1]`.
    ///
    /// Missing components read as 0; CMYK uses the naive
    /// `(1 - c)(1 - k)` conversion.
    pub fn to_rgb(&self, comps: &[f64]) -> [f64; 3] {
        let at = |i: usize| clamp01(comps.get(i).copied().unwrap_or(0.0));
        match self {
            Self::DeviceGray => {
                let g = at(0);
                [g, g, g]
            }
            Self::DeviceRGB => [at(0), at(1), at(2)],
            Self::DeviceCMYK => {
                let k = 1.0 - at(3);
                [(1.0 - at(0)) * k, (1.0 - at(1)) * k, (1.0 - at(2)) * k]
            }
            Self::ICCBased {
                alternate: Some(alt),
                ..
            } => alt.to_rgb(comps),
            Self::ICCBased { components, .. } => match components {
                1 => Self::DeviceGray.to_rgb(comps),
                4 => Self::DeviceCMYK.to_rgb(comps),
                _ => Self::DeviceRGB.to_rgb(comps),
            },
            Self::Pattern {
                underlying: Some(cs),
            } => cs.to_rgb(comps),
            Self::Pattern { underlying: None } => [0.0, 0.0, 0.0],
        }
    }
}

/// A colour value tagged with its colour space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub space: ColorSpace,
    pub components: Vec<f64>,
}

impl Color {
    pub fn new(space: ColorSpace, components: Vec<f64>) -> Self {
        Self { space, components }
    }

    pub fn gray(g: f64) -> Self {
        Self::new(ColorSpace::DeviceGray, vec![g])
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(ColorSpace::DeviceRGB, vec![r, g, b])
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new(ColorSpace::DeviceCMYK, vec![c, m, y, k])
    }

    /// The initial colour of a space.
    pub fn initial(space: ColorSpace) -> Self {
        let components = space.initial_components();
        Self { space, components }
    }

    pub fn to_rgb(&self) -> [f64; 3] {
        self.space.to_rgb(&self.components)
    }

    pub fn luminance(&self) -> f64 {
        luminance(self.to_rgb())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::gray(0.0)
    }
}

/// Luma of a straight RGB triple: `0.299 R + 0.587 G + 0.114 B`.
pub fn luminance(rgb: [f64; 3]) -> f64 {
    0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2]
}

/// Converts a `[0, 1]` channel to a byte.
pub fn to_byte(v: f64) -> u8 {
    (clamp01(v) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmyk_naive_conversion() {
        let rgb = ColorSpace::DeviceCMYK.to_rgb(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rgb, [0.0, 1.0, 1.0]);
        let black = ColorSpace::DeviceCMYK.to_rgb(&[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(black, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_icc_uses_alternate() {
        let cs = ColorSpace::ICCBased {
            components: 1,
            alternate: Some(Box::new(ColorSpace::DeviceGray)),
        };
        assert_eq!(cs.to_rgb(&[0.5]), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_luminance_extremes() {
        assert!((Color::rgb(1.0, 1.0, 1.0).luminance() - 1.0).abs() < 1e-9);
        assert_eq!(Color::gray(0.0).luminance(), 0.0);
    }

    #[test]
    fn test_initial_components() {
        assert_eq!(ColorSpace::DeviceCMYK.initial_components(), vec![0.0, 0.0, 0.0, 1.0]);
        assert!(ColorSpace::Pattern { underlying: None }.initial_components().is_empty());
    }
}
