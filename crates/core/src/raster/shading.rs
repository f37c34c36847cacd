//! Axial and radial shading rasterization.
//!
//! Used by `sh` and by fills with a shading pattern. The shading is sampled
//! at each pixel centre of a grid over the paint region; pixels outside the
//! painted path, outside the clip, or outside an un-extended parameter range
//! stay transparent.

use crate::model::color::to_byte;
use crate::model::{ColorSpace, FillRule, GraphicsState, RasterImage, Shading, ShadingKind};
use crate::raster::clip::clip_coverage;
use crate::raster::geometry::{self, Subpath};
use crate::raster::raster_dimensions;
use crate::utils::{
    Matrix, Point, Rect, apply_matrix_pt, invert_matrix, rect_is_drawable, unit_to_rect,
};

/// Parameter `s` in `[0, 1]` at shading-space point `q`, after extension.
fn parameter(kind: &ShadingKind, extend: (bool, bool), q: Point) -> Option<f64> {
    let s = match *kind {
        ShadingKind::Axial {
            coords: (x0, y0, x1, y1),
        } => {
            let (dx, dy) = (x1 - x0, y1 - y0);
            let denom = dx * dx + dy * dy;
            if denom <= f64::EPSILON {
                return None;
            }
            ((q.0 - x0) * dx + (q.1 - y0) * dy) / denom
        }
        ShadingKind::Radial {
            coords: (x0, y0, r0, x1, y1, r1),
        } => radial_parameter((x0, y0), r0, (x1, y1), r1, extend, q)?,
    };
    if s < 0.0 {
        extend.0.then_some(0.0)
    } else if s > 1.0 {
        extend.1.then_some(1.0)
    } else {
        Some(s)
    }
}

/// Largest `s` whose circle contains `q` with a non-negative radius.
///
/// The circle centre and radius interpolate linearly with `s`; solving
/// `|q - c(s)| = r(s)` gives a quadratic in `s`.
fn radial_parameter(
    c0: Point,
    r0: f64,
    c1: Point,
    r1: f64,
    extend: (bool, bool),
    q: Point,
) -> Option<f64> {
    let (dcx, dcy) = (c1.0 - c0.0, c1.1 - c0.1);
    let dr = r1 - r0;
    let (px, py) = (q.0 - c0.0, q.1 - c0.1);
    let a = dcx * dcx + dcy * dcy - dr * dr;
    let b = px * dcx + py * dcy + r0 * dr;
    let c = px * px + py * py - r0 * r0;

    let usable = |s: f64| {
        r0 + s * dr >= 0.0 && (s >= 0.0 || extend.0) && (s <= 1.0 || extend.1)
    };
    if a.abs() <= f64::EPSILON {
        if b.abs() <= f64::EPSILON {
            return None;
        }
        let s = c / (2.0 * b);
        return usable(s).then_some(s);
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let (s1, s2) = ((b + root) / a, (b - root) / a);
    let (hi, lo) = if s1 >= s2 { (s1, s2) } else { (s2, s1) };
    if usable(hi) {
        Some(hi)
    } else if usable(lo) {
        Some(lo)
    } else {
        None
    }
}

fn shade_rgb(def: &Shading, s: f64) -> [f64; 3] {
    let (t0, t1) = def.domain;
    let comps = def.function.eval(t0 + s * (t1 - t0));
    match &def.color_space {
        ColorSpace::Pattern { .. } => [0.0; 3],
        space => space.to_rgb(&comps),
    }
}

/// Rasterizes a shading over `region` (page space).
///
/// `shading_to_page` maps shading space to page space. When `clip` is
/// given only pixels inside that path are painted. Returns `None` when the
/// region has no drawable area, the budget is 0, or the shading space is
/// degenerate.
pub fn rasterize_shading(
    def: &Shading,
    shading_to_page: Matrix,
    region: Rect,
    clip: Option<(&[Subpath], FillRule)>,
    max_size: u32,
    state: &GraphicsState,
) -> Option<RasterImage> {
    if !rect_is_drawable(region) {
        return None;
    }
    let (width, height) = raster_dimensions(region.2 - region.0, region.3 - region.1, max_size)?;
    let to_shading = invert_matrix(shading_to_page)?;
    let placement = unit_to_rect(region);

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for row in 0..height {
        for col in 0..width {
            let u = (f64::from(col) + 0.5) / f64::from(width);
            let v = 1.0 - (f64::from(row) + 0.5) / f64::from(height);
            let p = apply_matrix_pt(placement, (u, v));
            let inside = clip.is_none_or(|(subpaths, rule)| {
                geometry::fill_contains(subpaths, rule, p)
            });
            let coverage = if inside { clip_coverage(state, p) } else { 0.0 };
            let s = (coverage > 0.0)
                .then(|| parameter(&def.kind, def.extend, apply_matrix_pt(to_shading, p)))
                .flatten();
            match s {
                Some(s) => {
                    pixels.extend(shade_rgb(def, s).map(to_byte));
                    pixels.push(to_byte(coverage));
                }
                None => pixels.extend([0; 4]),
            }
        }
    }

    let mut out_state = state.clone();
    out_state.ctm = placement;
    Some(RasterImage {
        pixels,
        width,
        height,
        color_space: ColorSpace::DeviceRGB,
        state: out_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Function;
    use crate::utils::MATRIX_IDENTITY;

    fn gray_ramp(kind: ShadingKind, extend: (bool, bool)) -> Shading {
        Shading {
            kind,
            color_space: ColorSpace::DeviceGray,
            function: Function::Exponential {
                domain: (0.0, 1.0),
                c0: vec![0.0],
                c1: vec![1.0],
                n: 1.0,
            },
            domain: (0.0, 1.0),
            extend,
            bbox: None,
        }
    }

    #[test]
    fn test_axial_ramp() {
        let def = gray_ramp(
            ShadingKind::Axial {
                coords: (0.0, 0.0, 100.0, 0.0),
            },
            (false, false),
        );
        let state = GraphicsState::default();
        let img = rasterize_shading(
            &def,
            MATRIX_IDENTITY,
            (0.0, 0.0, 100.0, 10.0),
            None,
            10,
            &state,
        )
        .unwrap();
        assert_eq!((img.width, img.height), (10, 1));
        assert_eq!(img.rgba(0, 0), [13, 13, 13, 255]);
        assert_eq!(img.rgba(9, 0), [242, 242, 242, 255]);
        assert_eq!(img.state.ctm, (100.0, 0.0, 0.0, 10.0, 0.0, 0.0));
    }

    #[test]
    fn test_axial_without_extend_is_transparent_outside() {
        let kind = ShadingKind::Axial {
            coords: (25.0, 0.0, 75.0, 0.0),
        };
        let state = GraphicsState::default();
        let region = (0.0, 0.0, 100.0, 10.0);
        let plain = rasterize_shading(
            &gray_ramp(kind.clone(), (false, false)),
            MATRIX_IDENTITY,
            region,
            None,
            10,
            &state,
        )
        .unwrap();
        assert_eq!(plain.rgba(0, 0)[3], 0);
        let extended = rasterize_shading(
            &gray_ramp(kind, (true, true)),
            MATRIX_IDENTITY,
            region,
            None,
            10,
            &state,
        )
        .unwrap();
        assert_eq!(extended.rgba(0, 0), [0, 0, 0, 255]);
        assert_eq!(extended.rgba(9, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_radial_parameter() {
        let kind = ShadingKind::Radial {
            coords: (50.0, 50.0, 0.0, 50.0, 50.0, 50.0),
        };
        let s = parameter(&kind, (false, false), (75.0, 50.0)).unwrap();
        assert!((s - 0.5).abs() < 1e-9);
        assert!(parameter(&kind, (false, false), (150.0, 50.0)).is_none());
    }

    #[test]
    fn test_path_clip_limits_pixels() {
        let def = gray_ramp(
            ShadingKind::Axial {
                coords: (0.0, 0.0, 100.0, 0.0),
            },
            (true, true),
        );
        let subpaths = geometry::flatten(
            &[crate::model::PathSegment::Rect(0.0, 0.0, 50.0, 10.0)],
            MATRIX_IDENTITY,
        );
        let img = rasterize_shading(
            &def,
            MATRIX_IDENTITY,
            (0.0, 0.0, 100.0, 10.0),
            Some((&subpaths, FillRule::NonZero)),
            10,
            &GraphicsState::default(),
        )
        .unwrap();
        assert_eq!(img.rgba(2, 0)[3], 255);
        assert_eq!(img.rgba(7, 0)[3], 0);
    }

    #[test]
    fn test_unbounded_region_is_skipped() {
        let def = gray_ramp(
            ShadingKind::Axial {
                coords: (0.0, 0.0, 1.0, 0.0),
            },
            (true, true),
        );
        let region = crate::utils::RECT_UNBOUNDED;
        assert!(
            rasterize_shading(&def, MATRIX_IDENTITY, region, None, 10, &GraphicsState::default())
                .is_none()
        );
    }
}
