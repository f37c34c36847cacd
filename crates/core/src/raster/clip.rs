//! Exact clip path rasterization.

use tracing::debug;

use crate::model::{FillRule, GraphicsState, MaskKind, PathSegment, SoftMask};
use crate::raster::geometry;
use crate::raster::raster_dimensions;
use crate::utils::{Matrix, Point, Rect, rect_is_drawable, unit_to_rect};

/// Rasterizes a clip path over `bbox` (page space) and intersects it with the
/// previous clip mask.
///
/// Each pixel is 255 where its centre is inside the path under `rule`, then
/// scaled by the previous mask sampled at the same page-space point.
/// Returns `None` when `bbox` has no drawable area.
pub fn rasterize_clip(
    segments: &[PathSegment],
    ctm: Matrix,
    rule: FillRule,
    bbox: Rect,
    previous: Option<&SoftMask>,
    max_size: u32,
) -> Option<SoftMask> {
    if !rect_is_drawable(bbox) {
        debug!(?bbox, "clip region is empty");
        return None;
    }
    let (width, height) = raster_dimensions(bbox.2 - bbox.0, bbox.3 - bbox.1, max_size)?;
    let subpaths = geometry::flatten(segments, ctm);

    let mut mask = SoftMask {
        kind: MaskKind::Alpha,
        width,
        height,
        alpha: Vec::with_capacity(width as usize * height as usize),
        bbox,
        matrix: unit_to_rect(bbox),
    };
    for row in 0..height {
        for col in 0..width {
            let p = mask.pixel_center(col, row);
            let inside = geometry::fill_contains(&subpaths, rule, p);
            let value = match (inside, previous) {
                (false, _) => 0,
                (true, None) => 255,
                (true, Some(prev)) => prev.sample(p),
            };
            mask.alpha.push(value);
        }
    }
    Some(mask)
}

/// Clip coverage of a page-space point under `state`: 0 outside the clip
/// bbox, otherwise the clip mask sample (1 without a mask).
pub fn clip_coverage(state: &GraphicsState, p: Point) -> f64 {
    let (x0, y0, x1, y1) = state.clip_bbox;
    if p.0 < x0 || p.0 > x1 || p.1 < y0 || p.1 > y1 {
        return 0.0;
    }
    state
        .clip_mask
        .as_ref()
        .map_or(1.0, |mask| f64::from(mask.sample(p)) / 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    fn triangle() -> Vec<PathSegment> {
        vec![
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::LineTo(100.0, 0.0),
            PathSegment::LineTo(0.0, 100.0),
            PathSegment::ClosePath,
        ]
    }

    #[test]
    fn test_clip_mask_follows_path() {
        let bbox = (0.0, 0.0, 100.0, 100.0);
        let mask =
            rasterize_clip(&triangle(), MATRIX_IDENTITY, FillRule::NonZero, bbox, None, 10)
                .unwrap();
        assert_eq!((mask.width, mask.height), (10, 10));
        // Bottom-left is inside, top-right is outside.
        assert_eq!(mask.sample((5.0, 5.0)), 255);
        assert_eq!(mask.sample((95.0, 95.0)), 0);
    }

    #[test]
    fn test_clip_mask_intersects_previous() {
        let bbox = (0.0, 0.0, 100.0, 100.0);
        let mut previous = rasterize_clip(
            &[PathSegment::Rect(0.0, 0.0, 100.0, 100.0)],
            MATRIX_IDENTITY,
            FillRule::NonZero,
            bbox,
            None,
            10,
        )
        .unwrap();
        // Punch out the bottom-left pixel.
        let last_row = previous.height - 1;
        previous.alpha[(last_row * previous.width) as usize] = 0;

        let mask = rasterize_clip(
            &triangle(),
            MATRIX_IDENTITY,
            FillRule::NonZero,
            bbox,
            Some(&previous),
            10,
        )
        .unwrap();
        assert_eq!(mask.sample((5.0, 5.0)), 0);
        assert_eq!(mask.sample((15.0, 5.0)), 255);
    }

    #[test]
    fn test_empty_region_has_no_mask() {
        let bbox = (10.0, 10.0, 5.0, 20.0);
        assert!(
            rasterize_clip(&triangle(), MATRIX_IDENTITY, FillRule::NonZero, bbox, None, 10)
                .is_none()
        );
    }

    #[test]
    fn test_clip_coverage_outside_bbox() {
        let mut state = GraphicsState::default();
        state.clip_bbox = (0.0, 0.0, 10.0, 10.0);
        assert_eq!(clip_coverage(&state, (5.0, 5.0)), 1.0);
        assert_eq!(clip_coverage(&state, (15.0, 5.0)), 0.0);
    }
}
