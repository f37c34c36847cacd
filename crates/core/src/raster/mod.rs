//! Rasterizers for clip paths, soft masks, masked fills and shadings.
//!
//! Coverage is binary per sample point: a pixel is covered when its centre
//! is inside the geometry. Every grid is sized from a caller budget, so the
//! largest buffer is `budget x budget` whatever the document declares.

pub mod clip;
pub mod geometry;
pub mod image;
pub mod masked_fill;
pub mod shading;
pub mod soft_mask;

pub use image::{DecodedImage, Jpeg2000Decoder};
pub use soft_mask::MaskValue;

/// Grid dimensions for a `width x height` area under budget `max_size`.
///
/// The longer side gets exactly `max_size` pixels and the other keeps the
/// aspect ratio (at least 1). Returns `None` for a zero budget or an area
/// without finite positive extent.
pub fn raster_dimensions(width: f64, height: f64, max_size: u32) -> Option<(u32, u32)> {
    if max_size == 0
        || !width.is_finite()
        || !height.is_finite()
        || width <= 0.0
        || height <= 0.0
    {
        return None;
    }
    let max = f64::from(max_size);
    let short = |ratio: f64| ((max * ratio).round() as u32).clamp(1, max_size);
    if width >= height {
        Some((max_size, short(height / width)))
    } else {
        Some((short(width / height), max_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_dimensions_aspect() {
        assert_eq!(raster_dimensions(200.0, 100.0, 64), Some((64, 32)));
        assert_eq!(raster_dimensions(10.0, 40.0, 64), Some((16, 64)));
        assert_eq!(raster_dimensions(1000.0, 1.0, 8), Some((8, 1)));
    }

    #[test]
    fn test_raster_dimensions_degenerate() {
        assert_eq!(raster_dimensions(10.0, 10.0, 0), None);
        assert_eq!(raster_dimensions(0.0, 10.0, 64), None);
        assert_eq!(raster_dimensions(f64::INFINITY, 10.0, 64), None);
    }
}
