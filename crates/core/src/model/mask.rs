//! Pixel alpha grids used for soft masks and rasterized clip paths.

use serde::{Deserialize, Serialize};

use crate::utils::{Matrix, Point, Rect, apply_matrix_pt, invert_matrix};

/// How a soft mask group's pixels become alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskKind {
    /// Group coverage is the mask.
    #[default]
    Alpha,
    /// Luminance of the composited group colour, scaled by coverage.
    Luminosity,
}

/// A rasterized alpha grid.
///
/// Row 0 is the top of the grid. `matrix` maps the grid's unit square
/// (origin bottom-left) to page space; `bbox` is the area the grid covers in
/// the mask's own space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftMask {
    pub kind: MaskKind,
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
    pub bbox: Rect,
    pub matrix: Matrix,
}

impl SoftMask {
    /// Page-space position of the centre of pixel (`col`, `row`).
    pub fn pixel_center(&self, col: u32, row: u32) -> Point {
        let u = (f64::from(col) + 0.5) / f64::from(self.width);
        let v = 1.0 - (f64::from(row) + 0.5) / f64::from(self.height);
        apply_matrix_pt(self.matrix, (u, v))
    }

    /// Alpha byte at pixel (`col`, `row`).
    #[inline]
    pub fn at(&self, col: u32, row: u32) -> u8 {
        self.alpha
            .get(row as usize * self.width as usize + col as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Nearest-neighbour sample at a page-space point; 0 outside the grid.
    pub fn sample(&self, point: Point) -> u8 {
        let Some(inv) = invert_matrix(self.matrix) else {
            return 0;
        };
        let (u, v) = apply_matrix_pt(inv, point);
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return 0;
        }
        let col = ((u * f64::from(self.width)) as u32).min(self.width.saturating_sub(1));
        let row = (((1.0 - v) * f64::from(self.height)) as u32).min(self.height.saturating_sub(1));
        self.at(col, row)
    }

    /// Whether the grid holds exactly `width * height` samples.
    pub fn is_consistent(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.alpha.len() == self.width as usize * self.height as usize
    }
}
