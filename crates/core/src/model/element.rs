//! Drawable elements produced by the interpreter.

use serde::{Deserialize, Serialize};

use super::color::ColorSpace;
use super::state::GraphicsState;
use crate::utils::Point;

/// One path construction operation.
///
/// Paths do not store a current point; the shorthand curves `v` and `y` are
/// kept as their own variants and resolved when the path is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Cubic with the current point as first control point (x2, y2, x3, y3)
    CurveToV(f64, f64, f64, f64),
    /// Cubic with the end point as second control point (x1, y1, x3, y3)
    CurveToY(f64, f64, f64, f64),
    /// Rectangle (x, y, w, h): four corners and an implicit close
    Rect(f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

impl PathSegment {
    /// Every point the segment names, control points included.
    pub fn points(&self) -> Vec<Point> {
        match *self {
            Self::MoveTo(x, y) | Self::LineTo(x, y) => vec![(x, y)],
            Self::CurveTo(x1, y1, x2, y2, x3, y3) => vec![(x1, y1), (x2, y2), (x3, y3)],
            Self::CurveToV(x2, y2, x3, y3) => vec![(x2, y2), (x3, y3)],
            Self::CurveToY(x1, y1, x3, y3) => vec![(x1, y1), (x3, y3)],
            Self::Rect(x, y, w, h) => vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)],
            Self::ClosePath => Vec::new(),
        }
    }
}

/// How a path element is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintOp {
    Fill,
    Stroke,
    FillStroke,
    /// `n`: the path is consumed without painting
    None,
}

impl PaintOp {
    pub const fn fills(self) -> bool {
        matches!(self, Self::Fill | Self::FillStroke)
    }

    pub const fn strokes(self) -> bool {
        matches!(self, Self::Stroke | Self::FillStroke)
    }
}

/// Polygon interior rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathElement {
    pub segments: Vec<PathSegment>,
    pub paint: PaintOp,
    /// Present for fills only
    pub fill_rule: Option<FillRule>,
    pub state: GraphicsState,
}

/// A contiguous run of shown text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Decoded text payload
    pub text: String,
    /// Raw string bytes as shown
    pub bytes: Vec<u8>,
    /// Baseline start in page space
    pub start: Point,
    /// Baseline end in page space
    pub end: Point,
    /// Font resource name
    pub font_name: String,
    pub base_font: String,
    /// Size set by Tf
    pub font_size: f64,
    /// Size after the text and current matrices are applied
    pub effective_font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    pub horizontal_scaling: f64,
    pub rise: f64,
    /// Page-space quad from descent to ascent across the advance
    pub outline: [Point; 4],
}

/// Text shown within one BT/ET object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub runs: Vec<TextRun>,
    pub state: GraphicsState,
}

/// An image XObject painted with `Do`.
///
/// The state CTM maps the unit square onto the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    pub name: String,
    pub state: GraphicsState,
}

/// Pixels rasterized by the interpreter itself.
///
/// `pixels` holds straight-alpha RGBA rows, top row first. The state CTM is
/// the placement transform mapping the unit square onto the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub state: GraphicsState,
}

impl RasterImage {
    /// RGBA of pixel (`col`, `row`).
    pub fn rgba(&self, col: u32, row: u32) -> [u8; 4] {
        let i = (row as usize * self.width as usize + col as usize) * 4;
        match self.pixels.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

/// Interpreter output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedElement {
    Path(PathElement),
    Text(TextElement),
    Image(ImageElement),
    RasterImage(RasterImage),
}

impl ParsedElement {
    /// The state snapshot the element was painted with.
    pub fn state(&self) -> &GraphicsState {
        match self {
            Self::Path(p) => &p.state,
            Self::Text(t) => &t.state,
            Self::Image(i) => &i.state,
            Self::RasterImage(r) => &r.state,
        }
    }

    pub fn as_path(&self) -> Option<&PathElement> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_raster(&self) -> Option<&RasterImage> {
        match self {
            Self::RasterImage(r) => Some(r),
            _ => None,
        }
    }
}
