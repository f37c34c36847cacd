//! Resource tables consulted by the interpreter.
//!
//! These are already-parsed resource definitions: font metrics, ExtGState
//! deltas, shadings, patterns, colour spaces and XObjects. Parsing them out of
//! a document is the caller's job. Lookups accept names with or without a
//! leading `/`.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::color::ColorSpace;
use super::mask::MaskKind;
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect};

fn key(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Glyph metrics for one font resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontMetrics {
    pub base_font: String,
    /// Glyph widths in 1/1000 em, keyed by character code
    pub widths: HashMap<u32, f64>,
    pub default_width: f64,
    pub ascent: f64,
    pub descent: f64,
    /// 1 for simple fonts, 2 for CID fonts
    pub code_bytes: u8,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            base_font: String::new(),
            widths: HashMap::new(),
            default_width: 500.0,
            ascent: 800.0,
            descent: -200.0,
            code_bytes: 1,
        }
    }
}

/// Metrics used when a font resource cannot be resolved.
pub static DEFAULT_FONT_METRICS: LazyLock<FontMetrics> = LazyLock::new(FontMetrics::default);

impl FontMetrics {
    /// Width of a glyph in 1/1000 em.
    pub fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    pub const fn is_multibyte(&self) -> bool {
        self.code_bytes >= 2
    }
}

/// Soft mask entry of an ExtGState.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SoftMaskRef {
    /// `/SMask /None`: remove any active mask
    None,
    Group(Box<SoftMaskGroup>),
}

/// A transparency group used as a soft mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftMaskGroup {
    pub kind: MaskKind,
    pub bbox: Rect,
    #[serde(default = "identity")]
    pub matrix: Matrix,
    #[serde(default)]
    pub resources: Resources,
    /// Raw content stream bytes of the group
    #[serde(default)]
    pub content: Vec<u8>,
    #[serde(default)]
    pub knockout: bool,
    #[serde(default)]
    pub isolated: bool,
    /// `/BC` backdrop components in the group colour space
    #[serde(default)]
    pub backdrop: Option<Vec<f64>>,
    #[serde(default)]
    pub color_space: Option<ColorSpace>,
}

const fn identity() -> Matrix {
    MATRIX_IDENTITY
}

/// Graphics state parameter dictionary applied by `gs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtGState {
    pub line_width: Option<f64>,
    pub line_cap: Option<i64>,
    pub line_join: Option<i64>,
    pub miter_limit: Option<f64>,
    pub dash: Option<(Vec<f64>, f64)>,
    /// `/CA`
    pub stroke_alpha: Option<f64>,
    /// `/ca`
    pub fill_alpha: Option<f64>,
    pub blend_mode: Option<String>,
    pub soft_mask: Option<SoftMaskRef>,
}

/// Colour function of a shading, evaluated over its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Function {
    /// Type 2: `c0 + t^n (c1 - c0)`
    Exponential {
        domain: (f64, f64),
        c0: Vec<f64>,
        c1: Vec<f64>,
        n: f64,
    },
    /// Type 3: sub-functions selected by `bounds`
    Stitching {
        domain: (f64, f64),
        functions: Vec<Function>,
        bounds: Vec<f64>,
        encode: Vec<(f64, f64)>,
    },
    /// Evenly spaced samples across the domain, linearly interpolated
    Sampled {
        domain: (f64, f64),
        samples: Vec<Vec<f64>>,
    },
}

impl Function {
    pub const fn domain(&self) -> (f64, f64) {
        match self {
            Self::Exponential { domain, .. }
            | Self::Stitching { domain, .. }
            | Self::Sampled { domain, .. } => *domain,
        }
    }

    /// Evaluates the function at `t` (clamped to the domain).
    pub fn eval(&self, t: f64) -> Vec<f64> {
        let (d0, d1) = self.domain();
        let t = t.clamp(d0.min(d1), d0.max(d1));
        match self {
            Self::Exponential { c0, c1, n, .. } => {
                let x = if *n == 1.0 { t } else { t.powf(*n) };
                c0.iter()
                    .zip(c1.iter())
                    .map(|(a, b)| a + x * (b - a))
                    .collect()
            }
            Self::Stitching {
                functions,
                bounds,
                encode,
                ..
            } => {
                if functions.is_empty() {
                    return Vec::new();
                }
                let k = bounds
                    .iter()
                    .position(|&b| t < b)
                    .unwrap_or(bounds.len())
                    .min(functions.len() - 1);
                let lo = if k == 0 { d0 } else { bounds[k - 1] };
                let hi = bounds.get(k).copied().unwrap_or(d1);
                let (e0, e1) = encode.get(k).copied().unwrap_or((0.0, 1.0));
                let local = if (hi - lo).abs() > f64::EPSILON {
                    e0 + (t - lo) * (e1 - e0) / (hi - lo)
                } else {
                    e0
                };
                functions[k].eval(local)
            }
            Self::Sampled { samples, .. } => {
                if samples.is_empty() {
                    return Vec::new();
                }
                if samples.len() == 1 || (d1 - d0).abs() < f64::EPSILON {
                    return samples[0].clone();
                }
                let pos = (t - d0) / (d1 - d0) * (samples.len() - 1) as f64;
                let i = (pos.floor() as usize).min(samples.len() - 2);
                let frac = pos - i as f64;
                samples[i]
                    .iter()
                    .zip(samples[i + 1].iter())
                    .map(|(a, b)| a + frac * (b - a))
                    .collect()
            }
        }
    }
}

/// Geometry of a shading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShadingKind {
    /// Type 2: (x0, y0, x1, y1)
    Axial { coords: (f64, f64, f64, f64) },
    /// Type 3: (x0, y0, r0, x1, y1, r1)
    Radial {
        coords: (f64, f64, f64, f64, f64, f64),
    },
}

/// A smooth shading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shading {
    pub kind: ShadingKind,
    pub color_space: ColorSpace,
    pub function: Function,
    /// Parametric domain (t0, t1)
    #[serde(default = "unit_domain")]
    pub domain: (f64, f64),
    #[serde(default)]
    pub extend: (bool, bool),
    /// Bounds in shading space
    #[serde(default)]
    pub bbox: Option<Rect>,
}

const fn unit_domain() -> (f64, f64) {
    (0.0, 1.0)
}

/// A pattern resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// PatternType 2
    Shading { matrix: Matrix, shading: Shading },
    /// PatternType 1
    Tiling {
        paint_type: i64,
        tiling_type: i64,
        bbox: Rect,
        x_step: f64,
        y_step: f64,
        matrix: Matrix,
        content: Vec<u8>,
    },
}

/// Compression applied to image samples.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageFilter {
    /// Samples are stored decoded
    #[default]
    None,
    /// JPEG2000 (`JPXDecode`)
    Jpx,
    /// Any other filter, by name
    Other(String),
}

/// An image XObject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    #[serde(default = "eight")]
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    #[serde(default)]
    pub filter: ImageFilter,
    #[serde(default)]
    pub data: Vec<u8>,
    /// `/SMask` image supplying per-pixel alpha
    #[serde(default)]
    pub smask: Option<Box<ImageXObject>>,
}

const fn eight() -> u8 {
    8
}

/// A form XObject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormXObject {
    pub bbox: Rect,
    #[serde(default = "identity")]
    pub matrix: Matrix,
    /// Own resources; the parent's are used when absent
    #[serde(default)]
    pub resources: Option<Resources>,
    pub content: Vec<u8>,
}

/// An XObject resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum XObject {
    Image(ImageXObject),
    Form(FormXObject),
}

/// Resource tables in force for one content stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub fonts: HashMap<String, FontMetrics>,
    pub ext_g_states: HashMap<String, ExtGState>,
    pub shadings: HashMap<String, Shading>,
    pub patterns: HashMap<String, Pattern>,
    pub color_spaces: HashMap<String, ColorSpace>,
    pub xobjects: HashMap<String, XObject>,
}

impl Resources {
    pub fn font(&self, name: &str) -> Option<&FontMetrics> {
        self.fonts.get(key(name))
    }

    pub fn ext_g_state(&self, name: &str) -> Option<&ExtGState> {
        self.ext_g_states.get(key(name))
    }

    pub fn shading(&self, name: &str) -> Option<&Shading> {
        self.shadings.get(key(name))
    }

    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(key(name))
    }

    pub fn color_space(&self, name: &str) -> Option<&ColorSpace> {
        self.color_spaces.get(key(name))
    }

    pub fn xobject(&self, name: &str) -> Option<&XObject> {
        self.xobjects.get(key(name))
    }

    /// Resolves font metrics by resource name.
    ///
    /// On a miss, a subset tag (everything up to and including `+`) is
    /// stripped and the lookup retried; after that the default metrics apply.
    pub fn resolve_font(&self, name: &str) -> (&FontMetrics, bool) {
        if let Some(metrics) = self.font(name) {
            return (metrics, true);
        }
        if let Some((_, stripped)) = key(name).split_once('+')
            && let Some(metrics) = self.font(stripped)
        {
            return (metrics, true);
        }
        (&*DEFAULT_FONT_METRICS, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_function() {
        let f = Function::Exponential {
            domain: (0.0, 1.0),
            c0: vec![0.0, 1.0],
            c1: vec![1.0, 0.0],
            n: 1.0,
        };
        assert_eq!(f.eval(0.25), vec![0.25, 0.75]);
        assert_eq!(f.eval(4.0), vec![1.0, 0.0]);
    }

    #[test]
    fn test_stitching_function_selects_subdomain() {
        let half = |c0: f64, c1: f64| Function::Exponential {
            domain: (0.0, 1.0),
            c0: vec![c0],
            c1: vec![c1],
            n: 1.0,
        };
        let f = Function::Stitching {
            domain: (0.0, 1.0),
            functions: vec![half(0.0, 1.0), half(1.0, 0.0)],
            bounds: vec![0.5],
            encode: vec![(0.0, 1.0), (0.0, 1.0)],
        };
        assert_eq!(f.eval(0.25), vec![0.5]);
        assert_eq!(f.eval(0.75), vec![0.5]);
        assert_eq!(f.eval(0.5), vec![1.0]);
    }

    #[test]
    fn test_sampled_function_interpolates() {
        let f = Function::Sampled {
            domain: (0.0, 1.0),
            samples: vec![vec![0.0], vec![1.0], vec![0.0]],
        };
        assert_eq!(f.eval(0.25), vec![0.5]);
        assert_eq!(f.eval(1.0), vec![0.0]);
    }

    #[test]
    fn test_resolve_font_strips_subset_prefix() {
        let mut res = Resources::default();
        res.fonts.insert(
            "Helvetica".to_string(),
            FontMetrics {
                default_width: 600.0,
                ..FontMetrics::default()
            },
        );
        let (m, found) = res.resolve_font("/ABCDEF+Helvetica");
        assert!(found);
        assert_eq!(m.default_width, 600.0);
        let (m, found) = res.resolve_font("Missing");
        assert!(!found);
        assert_eq!(m.default_width, 500.0);
    }
}
