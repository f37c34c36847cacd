//! Soft mask group evaluation.
//!
//! The group content is interpreted by a nested [`Interpreter`] in the
//! group's own space. A group that is just one opaque-shaped rectangle
//! spanning its bbox collapses to a scalar; anything else is composited into
//! an alpha grid.

use tracing::debug;

use crate::error::{PdfError, Result};
use crate::interp::{Interpreter, InterpreterOptions};
use crate::model::color::{luminance, to_byte};
use crate::model::{
    ColorSpace, MaskKind, PaintOp, ParsedElement, PathSegment, Resources, SoftMask, SoftMaskGroup,
    XObject,
};
use crate::raster::clip::clip_coverage;
use crate::raster::image::{DecodedImage, decode_image};
use crate::raster::masked_fill::CoverageSampler;
use crate::raster::raster_dimensions;
use crate::utils::{
    Matrix, Point, Rect, apply_matrix_pt, approx_eq, clamp01, invert_matrix, is_identity,
    mult_matrix, normalize_rect, unit_to_rect,
};

/// Tolerance for matching a fill rectangle against the group bbox.
const BBOX_TOLERANCE: f64 = 1e-6;

/// Result of evaluating a soft mask group.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskValue {
    /// Uniform alpha over the whole group
    Scalar(f64),
    Grid(SoftMask),
}

/// Evaluates a soft mask group established with `ctm` in force.
///
/// `depth` is the nesting level the group content runs at. Errors other
/// than fatal ones mean the mask cannot be resolved and the caller should
/// paint unmasked.
pub fn evaluate(
    group: &SoftMaskGroup,
    ctm: Matrix,
    options: &InterpreterOptions,
    depth: usize,
) -> Result<MaskValue> {
    let mut interp = Interpreter::nested(&group.resources, options, depth);
    interp.execute_bytes(&group.content)?;
    let elements = interp.finish();

    let bbox = normalize_rect(group.bbox);
    if let Some(alpha) = fast_path(group.kind, bbox, &elements) {
        debug!(alpha, "soft mask resolved to a constant");
        return Ok(MaskValue::Scalar(alpha));
    }

    let grid = composite(group, bbox, &elements, options)?;
    let matrix = mult_matrix(mult_matrix(unit_to_rect(bbox), group.matrix), ctm);
    let (width, height) = grid.dims;
    Ok(MaskValue::Grid(SoftMask {
        kind: group.kind,
        width,
        height,
        alpha: grid.alpha,
        bbox,
        matrix,
    }))
}

fn same_rect(a: Rect, b: Rect) -> bool {
    approx_eq(a.0, b.0, BBOX_TOLERANCE)
        && approx_eq(a.1, b.1, BBOX_TOLERANCE)
        && approx_eq(a.2, b.2, BBOX_TOLERANCE)
        && approx_eq(a.3, b.3, BBOX_TOLERANCE)
}

/// Scalar value of a group made of one identity-CTM fill of its bbox.
fn fast_path(kind: MaskKind, bbox: Rect, elements: &[ParsedElement]) -> Option<f64> {
    let [ParsedElement::Path(path)] = elements else {
        return None;
    };
    let state = &path.state;
    if path.paint != PaintOp::Fill || !is_identity(state.ctm) || state.fills_with_pattern() {
        return None;
    }
    let &[PathSegment::Rect(x, y, w, h)] = path.segments.as_slice() else {
        return None;
    };
    if !same_rect(normalize_rect((x, y, x + w, y + h)), bbox) {
        return None;
    }
    let alpha = clamp01(state.fill_alpha);
    Some(match kind {
        MaskKind::Alpha => alpha,
        MaskKind::Luminosity => clamp01(state.fill_color.luminance() * alpha),
    })
}

/// One compositing layer.
enum Layer {
    Vector(CoverageSampler),
    /// Pixels placed by `inverse` (form space to unit square)
    Pixels {
        image: DecodedImage,
        inverse: Matrix,
        alpha: f64,
    },
}

impl Layer {
    fn sample(&self, p: Point) -> Option<([f64; 3], f64)> {
        match self {
            Self::Vector(sampler) => sampler.sample(p),
            Self::Pixels {
                image,
                inverse,
                alpha,
            } => {
                let (u, v) = apply_matrix_pt(*inverse, p);
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    return None;
                }
                let col = ((u * f64::from(image.width)) as u32).min(image.width - 1);
                let row = (((1.0 - v) * f64::from(image.height)) as u32).min(image.height - 1);
                let [r, g, b, a] = image.pixel(col, row);
                let rgb = [r, g, b].map(|c| f64::from(c) / 255.0);
                Some((rgb, f64::from(a) / 255.0 * alpha))
            }
        }
    }
}

fn pixel_layer(image: DecodedImage, ctm: Matrix, alpha: f64) -> Result<Layer> {
    if image.width == 0 || image.height == 0 {
        return Err(PdfError::DecodeError("empty image in mask group".into()));
    }
    let inverse = invert_matrix(ctm)
        .ok_or_else(|| PdfError::UnsupportedMask("singular image placement".into()))?;
    Ok(Layer::Pixels {
        image,
        inverse,
        alpha: clamp01(alpha),
    })
}

/// Builds the compositing layer for one element; `None` paints nothing.
fn layer_for(
    element: &ParsedElement,
    resources: &Resources,
    options: &InterpreterOptions,
) -> Result<Option<Layer>> {
    match element {
        ParsedElement::Path(path) => {
            let state = &path.state;
            if (path.paint.fills() && state.fills_with_pattern())
                || (path.paint.strokes() && state.stroke_pattern.is_some())
            {
                return Err(PdfError::UnsupportedMask("pattern paint in mask group".into()));
            }
            Ok(CoverageSampler::from_element(element).map(Layer::Vector))
        }
        ParsedElement::Text(_) => Ok(CoverageSampler::from_element(element).map(Layer::Vector)),
        ParsedElement::Image(img) => {
            let Some(XObject::Image(xobj)) = resources.xobject(&img.name) else {
                return Err(PdfError::KeyError(img.name.clone()));
            };
            let decoded = decode_image(xobj, options.jpx_decoder.as_deref())?;
            pixel_layer(decoded, img.state.ctm, img.state.fill_alpha).map(Some)
        }
        ParsedElement::RasterImage(raster) => {
            let expected = raster.width as usize * raster.height as usize * 4;
            if raster.pixels.len() != expected {
                return Err(PdfError::DimensionMismatch {
                    expected,
                    got: raster.pixels.len(),
                });
            }
            let decoded = DecodedImage {
                width: raster.width,
                height: raster.height,
                rgba: raster.pixels.clone(),
            };
            pixel_layer(decoded, raster.state.ctm, raster.state.fill_alpha).map(Some)
        }
    }
}

/// RGB of the group backdrop, when one applies.
fn backdrop_rgb(group: &SoftMaskGroup) -> Result<Option<[f64; 3]>> {
    if group.kind != MaskKind::Luminosity || group.isolated {
        return Ok(None);
    }
    let Some(comps) = &group.backdrop else {
        return Ok(None);
    };
    let space = match &group.color_space {
        Some(space) if space.ncomponents() == comps.len() => space.clone(),
        _ => match comps.len() {
            1 => ColorSpace::DeviceGray,
            3 => ColorSpace::DeviceRGB,
            4 => ColorSpace::DeviceCMYK,
            n => {
                return Err(PdfError::UnsupportedMask(format!(
                    "backdrop with {n} components"
                )));
            }
        },
    };
    Ok(Some(space.to_rgb(comps)))
}

struct Grid {
    dims: (u32, u32),
    alpha: Vec<u8>,
}

/// Composites the group elements back to front into an alpha grid.
fn composite(
    group: &SoftMaskGroup,
    bbox: Rect,
    elements: &[ParsedElement],
    options: &InterpreterOptions,
) -> Result<Grid> {
    let (width, height) = raster_dimensions(
        bbox.2 - bbox.0,
        bbox.3 - bbox.1,
        options.soft_mask_max_size,
    )
    .ok_or_else(|| PdfError::UnsupportedMask(format!("cannot rasterize bbox {bbox:?}")))?;

    let mut layers = Vec::with_capacity(elements.len());
    for element in elements {
        if let Some(layer) = layer_for(element, &group.resources, options)? {
            layers.push((layer, element.state()));
        }
    }

    let to_form = unit_to_rect(bbox);
    let centers: Vec<Point> = (0..height)
        .flat_map(|row| {
            (0..width).map(move |col| {
                let u = (f64::from(col) + 0.5) / f64::from(width);
                let v = 1.0 - (f64::from(row) + 0.5) / f64::from(height);
                apply_matrix_pt(to_form, (u, v))
            })
        })
        .collect();

    // Premultiplied colour and coverage per pixel.
    let (init_rgb, init_a) = match backdrop_rgb(group)? {
        Some(rgb) => (rgb, 1.0),
        None => ([0.0; 3], 0.0),
    };
    let mut acc_rgb = vec![init_rgb; centers.len()];
    let mut acc_a = vec![init_a; centers.len()];

    for (layer, state) in &layers {
        for (i, &p) in centers.iter().enumerate() {
            let Some((rgb, a)) = layer.sample(p) else {
                continue;
            };
            let a = a * clip_coverage(state, p);
            if a <= 0.0 {
                continue;
            }
            if group.knockout {
                acc_rgb[i] = rgb.map(|c| c * a);
                acc_a[i] = a;
            } else {
                let keep = 1.0 - a;
                acc_rgb[i] = [0, 1, 2].map(|k| rgb[k] * a + acc_rgb[i][k] * keep);
                acc_a[i] = a + acc_a[i] * keep;
            }
        }
    }

    let alpha = acc_rgb
        .iter()
        .zip(&acc_a)
        .map(|(rgb, &a)| match group.kind {
            MaskKind::Alpha => to_byte(a),
            MaskKind::Luminosity if a > 0.0 => to_byte(luminance(rgb.map(|c| c / a)) * a),
            MaskKind::Luminosity => 0,
        })
        .collect();

    Ok(Grid {
        dims: (width, height),
        alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    fn group(kind: MaskKind, content: &[u8]) -> SoftMaskGroup {
        SoftMaskGroup {
            kind,
            bbox: (0.0, 0.0, 100.0, 100.0),
            matrix: MATRIX_IDENTITY,
            resources: Resources::default(),
            content: content.to_vec(),
            knockout: false,
            isolated: false,
            backdrop: None,
            color_space: None,
        }
    }

    fn grid(value: MaskValue) -> SoftMask {
        match value {
            MaskValue::Grid(mask) => mask,
            MaskValue::Scalar(a) => panic!("expected a grid, got scalar {a}"),
        }
    }

    #[test]
    fn test_luminosity_fast_path() {
        let opts = InterpreterOptions::default();
        let white = group(MaskKind::Luminosity, b"1 g 0 0 100 100 re f");
        let value = evaluate(&white, MATRIX_IDENTITY, &opts, 1).unwrap();
        let MaskValue::Scalar(a) = value else {
            panic!("expected scalar");
        };
        assert!((a - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_fill_produces_grid() {
        let opts = InterpreterOptions::default().with_soft_mask_max_size(4);
        let g = group(MaskKind::Alpha, b"0 0 50 100 re f");
        let mask = grid(evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap());
        assert_eq!((mask.width, mask.height), (4, 4));
        assert_eq!(mask.at(0, 0), 255);
        assert_eq!(mask.at(3, 3), 0);
    }

    #[test]
    fn test_mask_matrix_includes_ctm() {
        let opts = InterpreterOptions::default().with_soft_mask_max_size(4);
        let g = group(MaskKind::Alpha, b"0 0 50 100 re f");
        let ctm = (2.0, 0.0, 0.0, 2.0, 10.0, 10.0);
        let mask = grid(evaluate(&g, ctm, &opts, 1).unwrap());
        assert_eq!(mask.matrix, (200.0, 0.0, 0.0, 200.0, 10.0, 10.0));
        // Left half of the mask lands at page x in [10, 110].
        assert_eq!(mask.sample((50.0, 50.0)), 255);
        assert_eq!(mask.sample((150.0, 50.0)), 0);
    }

    #[test]
    fn test_knockout_replaces() {
        let opts = InterpreterOptions::default().with_soft_mask_max_size(2);
        let content = b"0 0 100 100 re f /A gs 0 0 100 100 re f";
        let mut g = group(MaskKind::Alpha, content);
        g.resources.ext_g_states.insert(
            "A".into(),
            crate::model::ExtGState {
                fill_alpha: Some(0.5),
                ..Default::default()
            },
        );
        let over = grid(evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap());
        assert_eq!(over.at(0, 0), 255);

        g.knockout = true;
        let knocked = grid(evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap());
        assert_eq!(knocked.at(0, 0), 128);
    }

    #[test]
    fn test_backdrop_fills_uncovered_pixels() {
        let opts = InterpreterOptions::default().with_soft_mask_max_size(2);
        let mut g = group(MaskKind::Luminosity, b"0 g 0 0 50 100 re f");
        g.backdrop = Some(vec![1.0]);
        let mask = grid(evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap());
        assert_eq!(mask.at(0, 0), 0);
        assert_eq!(mask.at(1, 0), 255);

        g.isolated = true;
        let mask = grid(evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap());
        assert_eq!(mask.at(1, 0), 0);
    }

    #[test]
    fn test_zero_budget_is_an_error() {
        let opts = InterpreterOptions::default().with_soft_mask_max_size(0);
        let g = group(MaskKind::Alpha, b"0 0 50 100 re f");
        let err = evaluate(&g, MATRIX_IDENTITY, &opts, 1).unwrap_err();
        assert!(!err.is_fatal());
    }
}
