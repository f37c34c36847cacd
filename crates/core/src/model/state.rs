//! Graphics and text state.
//!
//! `GraphicsState` is the record saved by `q` and restored by `Q`. Every
//! emitted element carries an owned copy of it taken at paint time.

use serde::{Deserialize, Serialize};

use super::color::{Color, ColorSpace};
use super::mask::SoftMask;
use crate::utils::{MATRIX_IDENTITY, Matrix, RECT_UNBOUNDED, Rect};

/// Line cap style (`J` operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Projecting,
}

impl LineCap {
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Round,
            2 => Self::Projecting,
            _ => Self::Butt,
        }
    }
}

/// Line join style (`j` operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Round,
            2 => Self::Bevel,
            _ => Self::Miter,
        }
    }
}

/// Text parameters that live in the graphics state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextParams {
    /// Character spacing (Tc)
    pub char_spacing: f64,
    /// Word spacing (Tw), applied to space glyphs
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz, 100 = normal)
    pub horizontal_scaling: f64,
    /// Text leading (TL)
    pub leading: f64,
    /// Text rendering mode (Tr, 0-7)
    pub render_mode: i64,
    /// Text rise (Ts)
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            render_mode: 0,
            rise: 0.0,
        }
    }
}

impl TextParams {
    /// Whether the rendering mode fills glyphs.
    pub const fn fills(&self) -> bool {
        matches!(self.render_mode, 0 | 2 | 4 | 6)
    }

    /// Whether the rendering mode strokes glyphs without filling them.
    pub const fn strokes_only(&self) -> bool {
        matches!(self.render_mode, 1 | 5)
    }
}

/// The graphics state record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsState {
    /// Current transformation matrix (user space to page space)
    pub ctm: Matrix,

    pub fill_color: Color,
    pub stroke_color: Color,
    pub fill_alpha: f64,
    pub stroke_alpha: f64,

    /// Line width in user space units
    pub line_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash_array: Vec<f64>,
    pub dash_phase: f64,
    pub rendering_intent: Option<String>,
    pub flatness: Option<f64>,

    /// Axis-aligned clip bounds in page space
    pub clip_bbox: Rect,
    /// Exact clip coverage when a clip raster budget is configured
    pub clip_mask: Option<SoftMask>,

    /// Scalar soft mask (1 = no masking)
    pub soft_mask_alpha: f64,
    pub soft_mask: Option<SoftMask>,
    pub blend_mode: String,

    /// Pattern name selected by `scn` in Pattern space
    pub fill_pattern: Option<String>,
    /// Pattern name selected by `SCN` in Pattern space
    pub stroke_pattern: Option<String>,

    pub text: TextParams,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
            fill_color: Color::default(),
            stroke_color: Color::default(),
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_array: Vec::new(),
            dash_phase: 0.0,
            rendering_intent: None,
            flatness: None,
            clip_bbox: RECT_UNBOUNDED,
            clip_mask: None,
            soft_mask_alpha: 1.0,
            soft_mask: None,
            blend_mode: "Normal".to_string(),
            fill_pattern: None,
            stroke_pattern: None,
            text: TextParams::default(),
        }
    }
}

impl GraphicsState {
    /// Create a state with the given CTM and everything else at defaults.
    pub fn with_ctm(ctm: Matrix) -> Self {
        Self {
            ctm,
            ..Self::default()
        }
    }

    /// Whether fills currently paint with a pattern.
    pub fn fills_with_pattern(&self) -> bool {
        self.fill_color.space.is_pattern() && self.fill_pattern.is_some()
    }

    /// Drops the fill pattern, falling back to the pattern's underlying space.
    pub fn clear_fill_pattern(&mut self) {
        self.fill_pattern = None;
        if let ColorSpace::Pattern { underlying } = &self.fill_color.space {
            let space = underlying
                .as_deref()
                .cloned()
                .unwrap_or(ColorSpace::DeviceGray);
            self.fill_color = Color::new(space.clone(), {
                let mut comps = self.fill_color.components.clone();
                comps.resize(space.ncomponents(), 0.0);
                comps
            });
        }
    }

    /// Resets soft masking to neutral.
    pub fn clear_soft_mask(&mut self) {
        self.soft_mask = None;
        self.soft_mask_alpha = 1.0;
    }

    /// Stroke half-width in page space.
    pub fn half_line_width(&self) -> f64 {
        let (a, b, _, _, _, _) = self.ctm;
        let scale = a.hypot(b);
        let width = self.line_width * scale;
        // A zero width means the thinnest line the device can render.
        if width > 0.0 { width / 2.0 } else { 0.5 }
    }
}
