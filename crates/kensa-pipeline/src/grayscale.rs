//! Image decoding and luminance conversion.
//!
//! [`decode`] is the decoding collaborator: raw bytes (PNG, JPEG, BMP,
//! WebP) in, a validated non-empty `RgbImage` out. The pipeline stages
//! themselves assume that precondition and never re-check it.
//!
//! [`luminance`] produces the single-channel image that segmentation
//! and quality assessment measure.

use image::{GrayImage, RgbImage};

use crate::types::PipelineError;

/// Decode raw image bytes into an 8-bit RGB image.
///
/// Any alpha channel is discarded. Grayscale sources are expanded to
/// three identical channels.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::ZeroArea`] if the decoded image has no pixels.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(PipelineError::ZeroArea {
            width: rgb.width(),
            height: rgb.height(),
        });
    }
    Ok(rgb)
}

/// Convert an RGB image to single-channel luminance.
#[must_use = "returns the luminance image"]
pub fn luminance(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Arithmetic mean of a grayscale image's pixel values.
///
/// Returns 0.0 for an empty image.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_luminance(gray: &GrayImage) -> f64 {
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
    sum as f64 / count as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Helper: encode an RGBA image as a PNG byte buffer.
    fn encode_png(img: &image::RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn decode_drops_alpha() {
        let img = image::RgbaImage::from_fn(3, 2, |_, _| image::Rgba([10, 20, 30, 0]));
        let rgb = decode(&encode_png(&img)).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [10, 20, 30]);
        }
    }

    #[test]
    fn luminance_preserves_dimensions() {
        let img = RgbImage::from_pixel(17, 31, image::Rgb([128, 64, 32]));
        let gray = luminance(&img);
        assert_eq!(gray.dimensions(), (17, 31));
    }

    #[test]
    fn luminance_is_weighted() {
        let lum = |rgb: [u8; 3]| luminance(&RgbImage::from_pixel(1, 1, image::Rgb(rgb))).get_pixel(0, 0).0[0];
        let (r, g, b) = (lum([255, 0, 0]), lum([0, 255, 0]), lum([0, 0, 255]));
        assert!(
            g > r && r > b,
            "expected green > red > blue luminance, got R={r} G={g} B={b}",
        );
    }

    #[test]
    fn gray_pixels_keep_their_value() {
        let gray = luminance(&RgbImage::from_pixel(4, 4, image::Rgb([210, 210, 210])));
        assert!(gray.pixels().all(|p| p.0[0] == 210));
    }

    #[test]
    fn mean_luminance_of_half_black_half_white() {
        let gray = GrayImage::from_fn(10, 4, |x, _| image::Luma([if x < 5 { 0 } else { 255 }]));
        assert!((mean_luminance(&gray) - 127.5).abs() < 1e-9);
    }

    #[test]
    fn mean_luminance_of_empty_image_is_zero() {
        assert!(mean_luminance(&GrayImage::new(0, 0)).abs() < f64::EPSILON);
    }
}
