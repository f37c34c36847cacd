//! Image XObject decoding for mask group compositing.
//!
//! Only what a soft mask needs: unfiltered 8-bit samples in any device
//! space, 1-bit gray, and JPEG2000 through an external decoder. Everything
//! else is a decode failure, which degrades the mask.

use crate::error::{PdfError, Result};
use crate::model::color::to_byte;
use crate::model::{ColorSpace, ImageFilter, ImageXObject};

/// Decoded pixels: straight-alpha RGBA, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// RGBA of pixel (`col`, `row`).
    pub fn pixel(&self, col: u32, row: u32) -> [u8; 4] {
        let i = (row as usize * self.width as usize + col as usize) * 4;
        match self.rgba.get(i..i + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

/// External JPEG2000 decoder.
///
/// Implementations return RGBA pixels; alpha is 255 unless the codestream
/// carries its own.
pub trait Jpeg2000Decoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage>;
}

/// Decodes an image XObject and applies its `/SMask`, if any.
///
/// A missing JPEG2000 decoder is reported as [`PdfError::MissingDecoder`].
pub fn decode_image(
    image: &ImageXObject,
    jpx: Option<&dyn Jpeg2000Decoder>,
) -> Result<DecodedImage> {
    let mut decoded = decode_samples(image, jpx)?;
    if let Some(smask) = &image.smask {
        let alpha = decode_samples(smask, jpx)?;
        if (alpha.width, alpha.height) != (decoded.width, decoded.height) {
            return Err(PdfError::DimensionMismatch {
                expected: decoded.width as usize * decoded.height as usize,
                got: alpha.width as usize * alpha.height as usize,
            });
        }
        // The mask image is gray, so its red channel is the alpha.
        for (px, a) in decoded
            .rgba
            .chunks_exact_mut(4)
            .zip(alpha.rgba.chunks_exact(4))
        {
            px[3] = a[0];
        }
    }
    Ok(decoded)
}

fn decode_samples(image: &ImageXObject, jpx: Option<&dyn Jpeg2000Decoder>) -> Result<DecodedImage> {
    match &image.filter {
        ImageFilter::None => decode_raw(image),
        ImageFilter::Jpx => {
            let decoder = jpx.ok_or_else(|| PdfError::MissingDecoder("JPXDecode".into()))?;
            let decoded = decoder.decode(&image.data)?;
            if (decoded.width, decoded.height) != (image.width, image.height)
                || decoded.rgba.len() != decoded.width as usize * decoded.height as usize * 4
            {
                return Err(PdfError::DimensionMismatch {
                    expected: image.width as usize * image.height as usize * 4,
                    got: decoded.rgba.len(),
                });
            }
            Ok(decoded)
        }
        ImageFilter::Other(name) => Err(PdfError::DecodeError(format!(
            "unsupported image filter {name}"
        ))),
    }
}

fn decode_raw(image: &ImageXObject) -> Result<DecodedImage> {
    let (w, h) = (image.width as usize, image.height as usize);
    if w == 0 || h == 0 {
        return Err(PdfError::DecodeError("empty image".into()));
    }
    let space = &image.color_space;
    let n = space.ncomponents();
    if n == 0 {
        return Err(PdfError::DecodeError("image in Pattern space".into()));
    }

    let mut rgba = Vec::with_capacity(w * h * 4);
    match image.bits_per_component {
        8 => {
            let expected = w * h * n;
            if image.data.len() < expected {
                return Err(PdfError::DimensionMismatch {
                    expected,
                    got: image.data.len(),
                });
            }
            let mut comps = vec![0.0; n];
            for px in image.data[..expected].chunks_exact(n) {
                for (c, &b) in comps.iter_mut().zip(px) {
                    *c = f64::from(b) / 255.0;
                }
                let rgb = space.to_rgb(&comps);
                rgba.extend(rgb.map(to_byte));
                rgba.push(255);
            }
        }
        1 if *space == ColorSpace::DeviceGray => {
            let stride = w.div_ceil(8);
            let expected = stride * h;
            if image.data.len() < expected {
                return Err(PdfError::DimensionMismatch {
                    expected,
                    got: image.data.len(),
                });
            }
            for row in image.data[..expected].chunks_exact(stride) {
                for col in 0..w {
                    let bit = (row[col / 8] >> (7 - col % 8)) & 1;
                    let v = if bit == 1 { 255 } else { 0 };
                    rgba.extend([v, v, v, 255]);
                }
            }
        }
        bpc => {
            return Err(PdfError::DecodeError(format!(
                "unsupported bits per component {bpc}"
            )));
        }
    }

    Ok(DecodedImage {
        width: image.width,
        height: image.height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, data: Vec<u8>) -> ImageXObject {
        ImageXObject {
            width,
            height,
            bits_per_component: 8,
            color_space: ColorSpace::DeviceGray,
            filter: ImageFilter::None,
            data,
            smask: None,
        }
    }

    #[test]
    fn test_decode_rgb() {
        let img = ImageXObject {
            color_space: ColorSpace::DeviceRGB,
            ..gray(1, 1, vec![255, 0, 128])
        };
        let out = decode_image(&img, None).unwrap();
        assert_eq!(out.rgba, vec![255, 0, 128, 255]);
    }

    #[test]
    fn test_decode_one_bit_gray() {
        let img = ImageXObject {
            bits_per_component: 1,
            ..gray(3, 1, vec![0b1010_0000])
        };
        let out = decode_image(&img, None).unwrap();
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(out.pixel(1, 0), [0, 0, 0, 255]);
        assert_eq!(out.pixel(2, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_smask_applies_alpha() {
        let mut img = gray(2, 1, vec![0, 255]);
        img.smask = Some(Box::new(gray(2, 1, vec![64, 128])));
        let out = decode_image(&img, None).unwrap();
        assert_eq!(out.pixel(0, 0)[3], 64);
        assert_eq!(out.pixel(1, 0)[3], 128);
    }

    #[test]
    fn test_smask_dimension_mismatch() {
        let mut img = gray(2, 1, vec![0, 255]);
        img.smask = Some(Box::new(gray(1, 1, vec![64])));
        assert!(matches!(
            decode_image(&img, None),
            Err(PdfError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_jpx_without_decoder_is_fatal() {
        let img = ImageXObject {
            filter: ImageFilter::Jpx,
            ..gray(1, 1, vec![])
        };
        let err = decode_image(&img, None).unwrap_err();
        assert!(err.is_fatal());
    }
}
