//! Path flattening and point coverage tests.
//!
//! Paths are flattened into page-space polylines once per element; the
//! per-pixel tests then run against the polylines.

use itertools::Itertools;

use crate::model::{FillRule, LineCap, PathSegment};
use crate::utils::{Matrix, Point, Rect, apply_matrix_pt, get_bound};

/// Line segments per flattened cubic.
pub const CURVE_SEGMENTS: usize = 20;

/// A flattened subpath in page space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subpath {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Subpath {
    /// Edges of the subpath; the closing edge is included when `close` is set.
    pub fn edges(&self, close: bool) -> impl Iterator<Item = (Point, Point)> + '_ {
        let closing = match (close, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) if self.points.len() > 1 && first != last => {
                Some((last, first))
            }
            _ => None,
        };
        self.points.iter().copied().tuple_windows().chain(closing)
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// Appends a flattened cubic. `c1` of `None` reuses the current point.
fn push_curve(
    current: &mut Subpath,
    start: &mut Option<Point>,
    cur: &mut Option<Point>,
    c1: Option<Point>,
    c2: Point,
    end: Point,
) {
    let p0 = cur.unwrap_or(end);
    if current.points.is_empty() {
        current.points.push(p0);
        *start = Some(p0);
    }
    let c1 = c1.unwrap_or(p0);
    current.points.extend(
        (1..=CURVE_SEGMENTS).map(|i| cubic_point(p0, c1, c2, end, i as f64 / CURVE_SEGMENTS as f64)),
    );
    *cur = Some(end);
}

/// Flattens path segments through `ctm` into page-space subpaths.
pub fn flatten(segments: &[PathSegment], ctm: Matrix) -> Vec<Subpath> {
    let tf = |x: f64, y: f64| apply_matrix_pt(ctm, (x, y));
    let mut out: Vec<Subpath> = Vec::new();
    let mut current = Subpath::default();
    let mut start: Option<Point> = None;
    let mut cur: Option<Point> = None;

    let flush = |current: &mut Subpath, out: &mut Vec<Subpath>| {
        if !current.points.is_empty() {
            out.push(std::mem::take(current));
        }
    };

    for seg in segments {
        match *seg {
            PathSegment::MoveTo(x, y) => {
                flush(&mut current, &mut out);
                let p = tf(x, y);
                current.points.push(p);
                start = Some(p);
                cur = Some(p);
            }
            PathSegment::LineTo(x, y) => {
                let p = tf(x, y);
                if current.points.is_empty() {
                    // Resume after a close, or start implicitly.
                    let from = cur.unwrap_or(p);
                    current.points.push(from);
                    start = Some(from);
                }
                current.points.push(p);
                cur = Some(p);
            }
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                let c1 = Some(tf(x1, y1));
                push_curve(&mut current, &mut start, &mut cur, c1, tf(x2, y2), tf(x3, y3));
            }
            PathSegment::CurveToV(x2, y2, x3, y3) => {
                push_curve(&mut current, &mut start, &mut cur, None, tf(x2, y2), tf(x3, y3));
            }
            PathSegment::CurveToY(x1, y1, x3, y3) => {
                let end = tf(x3, y3);
                push_curve(&mut current, &mut start, &mut cur, Some(tf(x1, y1)), end, end);
            }
            PathSegment::Rect(x, y, w, h) => {
                flush(&mut current, &mut out);
                out.push(Subpath {
                    points: vec![tf(x, y), tf(x + w, y), tf(x + w, y + h), tf(x, y + h)],
                    closed: true,
                });
                start = Some(tf(x, y));
                cur = start;
            }
            PathSegment::ClosePath => {
                if !current.points.is_empty() {
                    current.closed = true;
                    flush(&mut current, &mut out);
                }
                cur = start;
            }
        }
    }
    flush(&mut current, &mut out);
    out
}

/// Device-space bounds of every point a path names, control points included.
pub fn path_bbox(segments: &[PathSegment], ctm: Matrix) -> Rect {
    get_bound(
        segments
            .iter()
            .flat_map(PathSegment::points)
            .map(|p| apply_matrix_pt(ctm, p)),
    )
}

fn is_left(a: Point, b: Point, p: Point) -> f64 {
    (b.0 - a.0) * (p.1 - a.1) - (p.0 - a.0) * (b.1 - a.1)
}

/// Whether `p` is inside the filled area. Every subpath is implicitly closed.
pub fn fill_contains(subpaths: &[Subpath], rule: FillRule, p: Point) -> bool {
    match rule {
        FillRule::EvenOdd => {
            let mut inside = false;
            for (a, b) in subpaths.iter().flat_map(|s| s.edges(true)) {
                if (a.1 > p.1) != (b.1 > p.1) {
                    let x = (b.0 - a.0) * (p.1 - a.1) / (b.1 - a.1) + a.0;
                    if p.0 < x {
                        inside = !inside;
                    }
                }
            }
            inside
        }
        FillRule::NonZero => {
            let mut winding = 0i32;
            for (a, b) in subpaths.iter().flat_map(|s| s.edges(true)) {
                if a.1 <= p.1 {
                    if b.1 > p.1 && is_left(a, b, p) > 0.0 {
                        winding += 1;
                    }
                } else if b.1 <= p.1 && is_left(a, b, p) < 0.0 {
                    winding -= 1;
                }
            }
            winding != 0
        }
    }
}

/// Distance-based test of `p` against one stroked segment.
fn segment_covers(a: Point, b: Point, half: f64, cap: LineCap, p: Point) -> bool {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return match cap {
            LineCap::Round => (p.0 - a.0).hypot(p.1 - a.1) <= half,
            LineCap::Projecting => (p.0 - a.0).abs() <= half && (p.1 - a.1).abs() <= half,
            LineCap::Butt => false,
        };
    }
    let (ux, uy) = (dx / len, dy / len);
    // Position along the segment and perpendicular offset.
    let along = (p.0 - a.0) * ux + (p.1 - a.1) * uy;
    let across = ((p.0 - a.0) * uy - (p.1 - a.1) * ux).abs();
    match cap {
        LineCap::Round => {
            let t = along.clamp(0.0, len);
            let (cx, cy) = (a.0 + ux * t, a.1 + uy * t);
            (p.0 - cx).hypot(p.1 - cy) <= half
        }
        LineCap::Projecting => along >= -half && along <= len + half && across <= half,
        LineCap::Butt => along >= 0.0 && along <= len && across <= half,
    }
}

/// Whether `p` is within `half` of the stroked outline.
pub fn stroke_contains(subpaths: &[Subpath], half: f64, cap: LineCap, p: Point) -> bool {
    subpaths.iter().any(|s| {
        if s.points.len() == 1 {
            return segment_covers(s.points[0], s.points[0], half, cap, p);
        }
        s.edges(s.closed)
            .any(|(a, b)| segment_covers(a, b, half, cap, p))
    })
}

/// Whether `p` is inside a convex quad (either winding).
pub fn quad_contains(quad: &[Point; 4], p: Point) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let cross = is_left(quad[i], quad[(i + 1) % 4], p);
        if cross.abs() <= f64::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MATRIX_IDENTITY;

    fn square(x: f64, y: f64, size: f64) -> Vec<PathSegment> {
        vec![PathSegment::Rect(x, y, size, size)]
    }

    #[test]
    fn test_flatten_curve_segment_count() {
        let path = [
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::CurveTo(0.0, 10.0, 10.0, 10.0, 10.0, 0.0),
        ];
        let sub = flatten(&path, MATRIX_IDENTITY);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub[0].points.len(), CURVE_SEGMENTS + 1);
        assert_eq!(*sub[0].points.last().unwrap(), (10.0, 0.0));
    }

    #[test]
    fn test_fill_rules_differ_on_nested_squares() {
        // Outer and inner squares drawn with the same orientation.
        let mut path = square(0.0, 0.0, 100.0);
        path.extend(square(25.0, 25.0, 50.0));
        let sub = flatten(&path, MATRIX_IDENTITY);
        assert!(fill_contains(&sub, FillRule::NonZero, (50.0, 50.0)));
        assert!(!fill_contains(&sub, FillRule::EvenOdd, (50.0, 50.0)));
        assert!(fill_contains(&sub, FillRule::EvenOdd, (10.0, 10.0)));
        assert!(!fill_contains(&sub, FillRule::NonZero, (150.0, 50.0)));
    }

    #[test]
    fn test_stroke_caps() {
        let path = [PathSegment::MoveTo(0.0, 0.0), PathSegment::LineTo(10.0, 0.0)];
        let sub = flatten(&path, MATRIX_IDENTITY);
        // Beyond the end, within half width.
        let p = (11.0, 0.0);
        assert!(!stroke_contains(&sub, 2.0, LineCap::Butt, p));
        assert!(stroke_contains(&sub, 2.0, LineCap::Round, p));
        assert!(stroke_contains(&sub, 2.0, LineCap::Projecting, p));
        // Diagonal off the end: outside the round cap, inside the square one.
        let q = (11.8, 1.8);
        assert!(!stroke_contains(&sub, 2.0, LineCap::Round, q));
        assert!(stroke_contains(&sub, 2.0, LineCap::Projecting, q));
    }

    #[test]
    fn test_path_bbox_uses_control_points() {
        let path = [
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::CurveTo(0.0, 50.0, 10.0, 50.0, 10.0, 0.0),
        ];
        assert_eq!(path_bbox(&path, MATRIX_IDENTITY), (0.0, 0.0, 10.0, 50.0));
    }

    #[test]
    fn test_quad_contains() {
        let quad = [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)];
        assert!(quad_contains(&quad, (5.0, 2.5)));
        assert!(!quad_contains(&quad, (5.0, 6.0)));
    }
}
