//! Rasterizes soft-masked paths and text.
//!
//! A painted element whose state carries a soft mask grid becomes an RGBA
//! image on the mask's own grid: each pixel centre is tested against the
//! element's page-space geometry and the result is scaled by the mask.

use crate::model::color::to_byte;
use crate::model::{ColorSpace, FillRule, LineCap, ParsedElement, RasterImage};
use crate::raster::clip::clip_coverage;
use crate::raster::geometry::{self, Subpath};
use crate::utils::{Point, clamp01};

/// Area painted by the element.
#[derive(Debug, Clone)]
enum Area {
    Path { subpaths: Vec<Subpath>, rule: FillRule },
    /// Text run outlines
    Quads(Vec<[Point; 4]>),
}

#[derive(Debug, Clone)]
struct Paint {
    rgb: [f64; 3],
    alpha: f64,
}

/// Per-point colour and coverage of one path or text element.
///
/// Colours are straight RGB in `[0, 1]`; coverage already includes the
/// element's fill or stroke alpha.
#[derive(Debug, Clone)]
pub struct CoverageSampler {
    area: Option<(Area, Paint)>,
    stroke: Option<(Vec<Subpath>, f64, LineCap, Paint)>,
}

impl CoverageSampler {
    /// Builds a sampler for a path or text element.
    ///
    /// Returns `None` for elements that paint nothing (`n` paths, invisible
    /// text) and for images.
    pub fn from_element(element: &ParsedElement) -> Option<Self> {
        match element {
            ParsedElement::Path(path) => {
                let state = &path.state;
                if !path.paint.fills() && !path.paint.strokes() {
                    return None;
                }
                let subpaths = geometry::flatten(&path.segments, state.ctm);
                let area = path.paint.fills().then(|| {
                    (
                        Area::Path {
                            subpaths: subpaths.clone(),
                            rule: path.fill_rule.unwrap_or_default(),
                        },
                        Paint {
                            rgb: state.fill_color.to_rgb(),
                            alpha: state.fill_alpha,
                        },
                    )
                });
                let stroke = path.paint.strokes().then(|| {
                    (
                        subpaths,
                        state.half_line_width(),
                        state.line_cap,
                        Paint {
                            rgb: state.stroke_color.to_rgb(),
                            alpha: state.stroke_alpha,
                        },
                    )
                });
                Some(Self { area, stroke })
            }
            ParsedElement::Text(text) => {
                let state = &text.state;
                let paint = if state.text.fills() {
                    Paint {
                        rgb: state.fill_color.to_rgb(),
                        alpha: state.fill_alpha,
                    }
                } else if state.text.strokes_only() {
                    Paint {
                        rgb: state.stroke_color.to_rgb(),
                        alpha: state.stroke_alpha,
                    }
                } else {
                    return None;
                };
                let quads = text.runs.iter().map(|run| run.outline).collect();
                Some(Self {
                    area: Some((Area::Quads(quads), paint)),
                    stroke: None,
                })
            }
            ParsedElement::Image(_) | ParsedElement::RasterImage(_) => None,
        }
    }

    /// Straight colour and coverage at a page-space point, stroke composited
    /// over fill. `None` where nothing is painted.
    pub fn sample(&self, p: Point) -> Option<([f64; 3], f64)> {
        let fill = self.area.as_ref().and_then(|(area, paint)| {
            let inside = match area {
                Area::Path { subpaths, rule } => geometry::fill_contains(subpaths, *rule, p),
                Area::Quads(quads) => quads.iter().any(|q| geometry::quad_contains(q, p)),
            };
            inside.then_some(paint)
        });
        let stroke = self.stroke.as_ref().and_then(|(subpaths, half, cap, paint)| {
            geometry::stroke_contains(subpaths, *half, *cap, p).then_some(paint)
        });

        match (fill, stroke) {
            (None, None) => None,
            (Some(f), None) => Some((f.rgb, clamp01(f.alpha))),
            (None, Some(s)) => Some((s.rgb, clamp01(s.alpha))),
            (Some(f), Some(s)) => {
                let (fa, sa) = (clamp01(f.alpha), clamp01(s.alpha));
                let alpha = sa + fa * (1.0 - sa);
                if alpha <= 0.0 {
                    return Some(([0.0; 3], 0.0));
                }
                let mix = |i: usize| (s.rgb[i] * sa + f.rgb[i] * fa * (1.0 - sa)) / alpha;
                Some(([mix(0), mix(1), mix(2)], alpha))
            }
        }
    }
}

/// Rasterizes a path or text element through its state's soft mask.
///
/// The element's clip applies too, since the mask grid may extend past it.
///
/// Returns `None` when the state has no usable mask grid or the element
/// paints nothing; the caller then keeps the vector element.
pub fn rasterize_masked(element: &ParsedElement) -> Option<RasterImage> {
    let state = element.state();
    let mask = state.soft_mask.as_ref()?;
    if !mask.is_consistent() {
        return None;
    }
    let sampler = CoverageSampler::from_element(element)?;
    let scalar = clamp01(state.soft_mask_alpha);

    let mut pixels = Vec::with_capacity(mask.alpha.len() * 4);
    for row in 0..mask.height {
        for col in 0..mask.width {
            let p = mask.pixel_center(col, row);
            let m = f64::from(mask.at(col, row)) / 255.0 * clip_coverage(state, p);
            match sampler.sample(p) {
                Some((rgb, alpha)) if m > 0.0 => {
                    pixels.extend(rgb.map(to_byte));
                    pixels.push(to_byte(alpha * m * scalar));
                }
                _ => pixels.extend([0; 4]),
            }
        }
    }

    let mut out_state = state.clone();
    out_state.ctm = mask.matrix;
    out_state.clear_soft_mask();
    out_state.fill_alpha = 1.0;
    out_state.stroke_alpha = 1.0;
    out_state.clear_fill_pattern();

    Some(RasterImage {
        pixels,
        width: mask.width,
        height: mask.height,
        color_space: ColorSpace::DeviceRGB,
        state: out_state,
    })
}
