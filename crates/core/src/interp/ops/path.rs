//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Path construction:
//! - m: Move to
//! - l: Line to
//! - c, v, y: Bezier curves (cubic variants)
//! - h: Close subpath
//! - re: Rectangle shorthand
//!
//! Path painting:
//! - S/s: Stroke (s closes first)
//! - f/F/f*: Fill (F is legacy, f* uses even-odd rule)
//! - B/B*/b/b*: Fill then stroke
//! - n: End path without painting
//!
//! Clipping:
//! - W/W*: Intersect the clip with the pending path (non-zero/even-odd)

use tracing::debug;

use crate::interp::interpreter::Interpreter;
use crate::model::{
    FillRule, GraphicsState, PaintOp, ParsedElement, PathElement, PathSegment, Pattern,
};
use crate::raster::{clip, geometry, shading};
use crate::utils::{intersect_rect, mult_matrix};

#[allow(non_snake_case)]
impl<'a> Interpreter<'a> {
    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// Begins a new subpath at the given point.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        self.curpath.push(PathSegment::MoveTo(x, y));
    }

    /// Appends a straight line segment from the current point.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        self.curpath.push(PathSegment::LineTo(x, y));
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.curpath
            .push(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    /// Appends a cubic Bezier curve with the current point as first control point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.curpath.push(PathSegment::CurveToV(x2, y2, x3, y3));
    }

    /// Appends a cubic Bezier curve with the endpoint as second control point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        self.curpath.push(PathSegment::CurveToY(x1, y1, x3, y3));
    }

    /// Closes the current subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        self.curpath.push(PathSegment::ClosePath);
    }

    /// Appends a rectangle as one atomic, closed subpath.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.curpath.push(PathSegment::Rect(x, y, w, h));
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// Finalizes the pending path into an element and clears it.
    fn paint_path(&mut self, paint: PaintOp, fill_rule: FillRule, close: bool) {
        let mut segments = std::mem::take(&mut self.curpath);
        if close {
            segments.push(PathSegment::ClosePath);
        }
        // A lone synthetic close paints nothing.
        if segments.len() <= usize::from(close) {
            return;
        }

        let state = self.gstack.snapshot();
        let fill_rule = paint.fills().then_some(fill_rule);

        if paint.fills()
            && state.fills_with_pattern()
            && self.paint_shading_pattern(&segments, fill_rule.unwrap_or_default(), &state)
        {
            if paint == PaintOp::FillStroke {
                let mut stroke_state = state;
                stroke_state.clear_fill_pattern();
                self.emit(ParsedElement::Path(PathElement {
                    segments,
                    paint: PaintOp::Stroke,
                    fill_rule: None,
                    state: stroke_state,
                }));
            }
            return;
        }

        self.emit(ParsedElement::Path(PathElement {
            segments,
            paint,
            fill_rule,
            state,
        }));
    }

    /// Rasterizes a shading-pattern fill of `segments`.
    ///
    /// Returns false when the pattern is not a shading pattern or nothing
    /// could be rasterized; the caller then emits the path as vectors.
    fn paint_shading_pattern(
        &mut self,
        segments: &[PathSegment],
        rule: FillRule,
        state: &GraphicsState,
    ) -> bool {
        let resources: &'a _ = self.resources;
        let Some(name) = state.fill_pattern.as_deref() else {
            return false;
        };
        let Some(Pattern::Shading {
            matrix,
            shading: def,
        }) = resources.pattern(name)
        else {
            return false;
        };

        let pattern_to_page = mult_matrix(*matrix, self.base_ctm);
        let subpaths = geometry::flatten(segments, state.ctm);
        let region = intersect_rect(geometry::path_bbox(segments, state.ctm), state.clip_bbox);
        let Some(mut raster) = shading::rasterize_shading(
            def,
            pattern_to_page,
            region,
            Some((&subpaths, rule)),
            self.options.shading_max_size,
            state,
        ) else {
            debug!(pattern = name, "shading pattern fill skipped");
            return false;
        };
        raster.state.clear_fill_pattern();
        self.emit(ParsedElement::RasterImage(raster));
        true
    }

    /// Strokes the current path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.paint_path(PaintOp::Stroke, FillRule::NonZero, false);
    }

    /// Closes and strokes the current path.
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.paint_path(PaintOp::Stroke, FillRule::NonZero, true);
    }

    /// Fills the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `f`
    pub fn do_f(&mut self) {
        self.paint_path(PaintOp::Fill, FillRule::NonZero, false);
    }

    /// Fills the current path using the nonzero winding number rule (obsolete).
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) {
        self.do_f();
    }

    /// Fills the current path using the even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) {
        self.paint_path(PaintOp::Fill, FillRule::EvenOdd, false);
    }

    /// Fills and strokes the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        self.paint_path(PaintOp::FillStroke, FillRule::NonZero, false);
    }

    /// Fills and strokes the current path using the even-odd rule.
    ///
    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) {
        self.paint_path(PaintOp::FillStroke, FillRule::EvenOdd, false);
    }

    /// Closes, fills, and strokes the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.paint_path(PaintOp::FillStroke, FillRule::NonZero, true);
    }

    /// Closes, fills, and strokes the current path using the even-odd rule.
    ///
    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) {
        self.paint_path(PaintOp::FillStroke, FillRule::EvenOdd, true);
    }

    /// Ends the path without filling or stroking it.
    ///
    /// A non-empty path is still emitted, tagged `PaintOp::None`.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.paint_path(PaintOp::None, FillRule::NonZero, false);
    }

    // ========================================================================
    // Clipping Path Operators
    // ========================================================================

    /// Intersects the clip with the pending path, then clears the path.
    fn clip_path(&mut self, rule: FillRule) {
        let segments = std::mem::take(&mut self.curpath);
        if segments.is_empty() {
            return;
        }
        let max_size = self.options.clip_max_size;
        let state = self.gstack.current_mut();
        let path_bbox = geometry::path_bbox(&segments, state.ctm);
        if !path_bbox.0.is_finite()
            || !path_bbox.1.is_finite()
            || !path_bbox.2.is_finite()
            || !path_bbox.3.is_finite()
        {
            debug!("clip path has no finite bounds");
            return;
        }
        if path_bbox.0 > path_bbox.2 || path_bbox.1 > path_bbox.3 {
            debug!("clip path has no points");
            return;
        }
        let bbox = intersect_rect(state.clip_bbox, path_bbox);
        if max_size > 0 {
            state.clip_mask = clip::rasterize_clip(
                &segments,
                state.ctm,
                rule,
                bbox,
                state.clip_mask.as_ref(),
                max_size,
            );
        }
        state.clip_bbox = bbox;
    }

    /// Sets the clipping path using the nonzero winding number rule.
    ///
    /// PDF operator: `W`
    pub fn do_W(&mut self) {
        self.clip_path(FillRule::NonZero);
    }

    /// Sets the clipping path using the even-odd rule.
    ///
    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) {
        self.clip_path(FillRule::EvenOdd);
    }
}
