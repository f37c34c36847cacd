//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! These operators manage the graphics state stack and transformation matrix.
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling (width, cap, join, miter limit, dash)
//! - ri, i: Rendering intent and flatness
//! - gs: Set parameters from graphics state dictionary, including soft masks

use tracing::{debug, warn};

use crate::error::Result;
use crate::interp::interpreter::Interpreter;
use crate::model::{LineCap, LineJoin, SoftMaskGroup, SoftMaskRef};
use crate::raster::soft_mask::{self, MaskValue};
use crate::utils::{Matrix, mult_matrix};

#[allow(non_snake_case)]
impl<'a> Interpreter<'a> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push();
    }

    /// Restores the graphics state from the stack.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        self.gstack.pop();
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) {
        let state = self.gstack.current_mut();
        state.ctm = mult_matrix(matrix, state.ctm);
    }

    /// Sets the line width in user space units.
    ///
    /// PDF operator: `w`
    pub fn do_w(&mut self, linewidth: f64) {
        self.gstack.current_mut().line_width = linewidth;
    }

    /// Sets the line cap style in the graphics state.
    ///
    /// PDF operator: `J`
    pub fn do_J(&mut self, linecap: i64) {
        self.gstack.current_mut().line_cap = LineCap::from_code(linecap);
    }

    /// Sets the line join style in the graphics state.
    ///
    /// PDF operator: `j`
    pub fn do_j(&mut self, linejoin: i64) {
        self.gstack.current_mut().line_join = LineJoin::from_code(linejoin);
    }

    /// Sets the miter limit in the graphics state.
    ///
    /// PDF operator: `M`
    pub fn do_M(&mut self, miterlimit: f64) {
        self.gstack.current_mut().miter_limit = miterlimit;
    }

    /// Sets the line dash pattern in the graphics state.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, dash_array: Vec<f64>, phase: f64) {
        let state = self.gstack.current_mut();
        state.dash_array = dash_array;
        state.dash_phase = phase;
    }

    /// Sets the color rendering intent in the graphics state.
    ///
    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &str) {
        self.gstack.current_mut().rendering_intent = Some(intent.to_string());
    }

    /// Sets the flatness tolerance in the graphics state.
    ///
    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: f64) {
        self.gstack.current_mut().flatness = Some(flatness);
    }

    /// Sets parameters from a graphics state parameter dictionary.
    ///
    /// A soft mask group is evaluated immediately against the CTM in force.
    /// Only a fatal error (a missing decoder) is returned; any other failure
    /// leaves the state unmasked.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &str) -> Result<()> {
        let resources: &'a _ = self.resources;
        let Some(ext) = resources.ext_g_state(name) else {
            debug!(name, "ExtGState not found");
            return Ok(());
        };

        let state = self.gstack.current_mut();
        if let Some(width) = ext.line_width {
            state.line_width = width;
        }
        if let Some(cap) = ext.line_cap {
            state.line_cap = LineCap::from_code(cap);
        }
        if let Some(join) = ext.line_join {
            state.line_join = LineJoin::from_code(join);
        }
        if let Some(limit) = ext.miter_limit {
            state.miter_limit = limit;
        }
        if let Some((array, phase)) = &ext.dash {
            state.dash_array.clone_from(array);
            state.dash_phase = *phase;
        }
        if let Some(alpha) = ext.stroke_alpha {
            state.stroke_alpha = alpha.clamp(0.0, 1.0);
        }
        if let Some(alpha) = ext.fill_alpha {
            state.fill_alpha = alpha.clamp(0.0, 1.0);
        }
        if let Some(mode) = &ext.blend_mode {
            state.blend_mode.clone_from(mode);
        }

        match &ext.soft_mask {
            Some(SoftMaskRef::None) => state.clear_soft_mask(),
            Some(SoftMaskRef::Group(group)) => self.apply_soft_mask(group)?,
            None => {}
        }
        Ok(())
    }

    fn apply_soft_mask(&mut self, group: &SoftMaskGroup) -> Result<()> {
        if self.mask_depth >= self.options.max_mask_depth {
            warn!(
                depth = self.mask_depth,
                "soft mask nesting limit reached, ignoring mask"
            );
            self.gstack.current_mut().clear_soft_mask();
            return Ok(());
        }

        let ctm = self.gstack.current().ctm;
        let value = soft_mask::evaluate(group, ctm, self.options, self.mask_depth + 1);
        let state = self.gstack.current_mut();
        match value {
            Ok(MaskValue::Scalar(alpha)) => {
                state.soft_mask = None;
                state.soft_mask_alpha = alpha;
            }
            Ok(MaskValue::Grid(mask)) => {
                state.soft_mask = Some(mask);
                state.soft_mask_alpha = 1.0;
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(%err, "soft mask could not be resolved, painting unmasked");
                state.clear_soft_mask();
            }
        }
        Ok(())
    }
}
