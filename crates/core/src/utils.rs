//! Geometry helpers shared by the interpreter and the rasterizers.
//!
//! Provides:
//! - Geometric types (Point, Rect, Matrix)
//! - Matrix composition, inversion and application
//! - Rectangle intersection and area

/// Floating-point infinity for bounding box calculations.
pub const INF_F64: f64 = f64::MAX;

/// Small epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1e-9;

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (x0, y0, x1, y1) where (x0, y0) is typically bottom-left
/// and (x1, y1) is top-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// The unbounded rectangle used as the initial clip.
pub const RECT_UNBOUNDED: Rect = (-INF_F64, -INF_F64, INF_F64, INF_F64);

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Clamps a value into `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Composes two matrices so that `m1` is applied first, then `m0`.
///
/// `mult_matrix(tm, ctm)` is the text rendering matrix; `mult_matrix(m, ctm)`
/// is the new CTM after `m cm`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Translates a matrix by (x, y) inside the projection.
///
/// The matrix is changed so that its origin is at the specified point in its own
/// coordinate system. Note that this is different from translating it within the
/// original coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Inverts an affine matrix. Returns `None` when it is singular.
pub fn invert_matrix(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det.abs() < EPSILON || !det.is_finite() {
        return None;
    }
    let ia = d / det;
    let ib = -b / det;
    let ic = -c / det;
    let id = a / det;
    Some((ia, ib, ic, id, -(e * ia + f * ic), -(e * ib + f * id)))
}

/// Whether a matrix is the identity within `EPSILON`.
pub fn is_identity(m: Matrix) -> bool {
    let (a, b, c, d, e, f) = m;
    approx_eq(a, 1.0, EPSILON)
        && approx_eq(b, 0.0, EPSILON)
        && approx_eq(c, 0.0, EPSILON)
        && approx_eq(d, 1.0, EPSILON)
        && approx_eq(e, 0.0, EPSILON)
        && approx_eq(f, 0.0, EPSILON)
}

/// Matrix mapping the unit square onto `rect`.
pub fn unit_to_rect(rect: Rect) -> Matrix {
    let (x0, y0, x1, y1) = rect;
    (x1 - x0, 0.0, 0.0, y1 - y0, x0, y0)
}

/// Bounding box of a set of points.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Rect {
    let mut x0 = INF_F64;
    let mut y0 = INF_F64;
    let mut x1 = -INF_F64;
    let mut y1 = -INF_F64;
    for (x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    (x0, y0, x1, y1)
}

/// Applies a matrix to a rectangle, returning the axis-aligned bounds of the
/// transformed corners.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    get_bound([(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|p| apply_matrix_pt(m, p)))
}

/// Normalizes a rectangle so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

/// Intersects two rectangles: max of the mins, min of the maxes.
///
/// The result may be inverted (x1 < x0) when the inputs do not overlap;
/// `rect_area` reports such rectangles as empty.
pub fn intersect_rect(a: Rect, b: Rect) -> Rect {
    (a.0.max(b.0), a.1.max(b.1), a.2.min(b.2), a.3.min(b.3))
}

/// Area of a rectangle, zero when inverted.
pub fn rect_area(r: Rect) -> f64 {
    (r.2 - r.0).max(0.0) * (r.3 - r.1).max(0.0)
}

/// Whether all four coordinates are finite and the area is positive.
pub fn rect_is_drawable(r: Rect) -> bool {
    r.0.is_finite()
        && r.1.is_finite()
        && r.2.is_finite()
        && r.3.is_finite()
        && r.2 - r.0 > 0.0
        && r.3 - r.1 > 0.0
}
