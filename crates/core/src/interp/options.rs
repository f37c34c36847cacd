//! Interpreter configuration.

use std::fmt;
use std::sync::Arc;

use crate::raster::image::Jpeg2000Decoder;
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect};

/// Caller-supplied settings for one interpretation run.
///
/// Raster budgets cap the longer side of a generated pixel grid. A budget of
/// 0 disables that raster step.
#[derive(Clone)]
pub struct InterpreterOptions {
    /// CTM of the base graphics state
    pub initial_ctm: Matrix,
    /// Initial clip bounds; unbounded when `None`
    pub page_bbox: Option<Rect>,
    /// Budget for shading and shading-pattern rasters
    pub shading_max_size: u32,
    /// Budget for exact clip masks; 0 keeps only the clip bbox
    pub clip_max_size: u32,
    /// Budget for vector soft masks
    pub soft_mask_max_size: u32,
    /// Nesting limit for soft mask groups referencing further soft masks
    pub max_mask_depth: usize,
    /// Nesting limit for form XObjects
    pub max_form_depth: usize,
    pub jpx_decoder: Option<Arc<dyn Jpeg2000Decoder>>,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            initial_ctm: MATRIX_IDENTITY,
            page_bbox: None,
            shading_max_size: 256,
            clip_max_size: 0,
            soft_mask_max_size: 256,
            max_mask_depth: 8,
            max_form_depth: 16,
            jpx_decoder: None,
        }
    }
}

impl fmt::Debug for InterpreterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterOptions")
            .field("initial_ctm", &self.initial_ctm)
            .field("page_bbox", &self.page_bbox)
            .field("shading_max_size", &self.shading_max_size)
            .field("clip_max_size", &self.clip_max_size)
            .field("soft_mask_max_size", &self.soft_mask_max_size)
            .field("max_mask_depth", &self.max_mask_depth)
            .field("max_form_depth", &self.max_form_depth)
            .field("jpx_decoder", &self.jpx_decoder.is_some())
            .finish()
    }
}

impl InterpreterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_initial_ctm(mut self, ctm: Matrix) -> Self {
        self.initial_ctm = ctm;
        self
    }

    pub const fn with_page_bbox(mut self, bbox: Rect) -> Self {
        self.page_bbox = Some(bbox);
        self
    }

    pub const fn with_shading_max_size(mut self, size: u32) -> Self {
        self.shading_max_size = size;
        self
    }

    pub const fn with_clip_max_size(mut self, size: u32) -> Self {
        self.clip_max_size = size;
        self
    }

    pub const fn with_soft_mask_max_size(mut self, size: u32) -> Self {
        self.soft_mask_max_size = size;
        self
    }

    pub const fn with_max_mask_depth(mut self, depth: usize) -> Self {
        self.max_mask_depth = depth;
        self
    }

    pub const fn with_max_form_depth(mut self, depth: usize) -> Self {
        self.max_form_depth = depth;
        self
    }

    pub fn with_jpx_decoder(mut self, decoder: Arc<dyn Jpeg2000Decoder>) -> Self {
        self.jpx_decoder = Some(decoder);
        self
    }
}
