//! Shading operator.
//!
//! Handles: sh
//!
//! Paints a shading over the current clip region as a raster image.

use tracing::debug;

use crate::interp::interpreter::Interpreter;
use crate::model::ParsedElement;
use crate::raster::shading;
use crate::utils::{apply_matrix_rect, intersect_rect};

impl<'a> Interpreter<'a> {
    /// sh - Paint the named shading, clipped to the current clip bbox.
    ///
    /// A region with no finite bounds (no clip, no page bbox and no shading
    /// bbox) is skipped.
    pub fn do_sh(&mut self, name: &str) {
        let resources: &'a _ = self.resources;
        let Some(def) = resources.shading(name) else {
            debug!(name, "shading not found");
            return;
        };
        let state = self.gstack.snapshot();
        let mut region = state.clip_bbox;
        if let Some(bbox) = def.bbox {
            region = intersect_rect(region, apply_matrix_rect(state.ctm, bbox));
        }
        match shading::rasterize_shading(
            def,
            state.ctm,
            region,
            None,
            self.options.shading_max_size,
            &state,
        ) {
            Some(raster) => self.emit(ParsedElement::RasterImage(raster)),
            None => debug!(name, "shading skipped"),
        }
    }
}
