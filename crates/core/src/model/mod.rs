//! Data model types - state, colour, masks, elements and resources.
//!
//! This module contains:
//! - `color` - Colour spaces and conversion to RGB
//! - `state` - Graphics state record (GraphicsState, TextParams)
//! - `mask` - Pixel alpha grids for soft masks and clip paths
//! - `element` - Interpreter output (ParsedElement, TextRun, PathSegment)
//! - `resources` - Resource tables (fonts, ExtGState, shadings, patterns, XObjects)

pub mod color;
pub mod element;
pub mod mask;
pub mod resources;
pub mod state;

// Re-export main types for convenience
pub use color::{Color, ColorSpace};
pub use element::{
    FillRule, ImageElement, PaintOp, ParsedElement, PathElement, PathSegment, RasterImage,
    TextElement, TextRun,
};
pub use mask::{MaskKind, SoftMask};
pub use resources::{
    DEFAULT_FONT_METRICS, ExtGState, FontMetrics, FormXObject, Function, ImageFilter,
    ImageXObject, Pattern, Resources, Shading, ShadingKind, SoftMaskGroup, SoftMaskRef, XObject,
};
pub use state::{GraphicsState, LineCap, LineJoin, TextParams};
