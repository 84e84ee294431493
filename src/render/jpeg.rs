// Phase 5: image crate: flattened page surface -> JPEG bytes

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::error::PdfSqueezeError;

/// Encode a page surface to JPEG bytes.
///
/// Luma surfaces are written as single-channel JPEGs; everything else is
/// converted to RGB first (dropping the alpha channel, which is expected to
/// be fully opaque after flattening).
///
/// # Arguments
/// * `surface` - Flattened page surface
/// * `quality` - JPEG quality (1 = worst, 100 = best)
pub fn encode_surface(surface: &DynamicImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(PdfSqueezeError::encode(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    match surface {
        DynamicImage::ImageLuma8(gray) => encode_gray_to_jpeg(gray, quality),
        DynamicImage::ImageRgb8(rgb) => encode_rgb_to_jpeg(rgb, quality),
        other => encode_rgb_to_jpeg(&other.to_rgb8(), quality),
    }
}

pub(crate) fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;

    Ok(buf.into_inner())
}

pub(crate) fn encode_gray_to_jpeg(gray: &GrayImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    gray.write_with_encoder(encoder)?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba, RgbaImage};

    #[test]
    fn rejects_out_of_range_quality() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([255])));
        assert!(encode_surface(&img, 0).is_err());
        assert!(encode_surface(&img, 101).is_err());
    }

    #[test]
    fn gray_surface_stays_single_channel() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 8, Luma([200])));
        let bytes = encode_surface(&img, 60).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn rgba_surface_is_encoded_as_rgb() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])));
        let bytes = encode_surface(&img, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }
}
