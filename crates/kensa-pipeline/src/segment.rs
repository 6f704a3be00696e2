//! Foreground/background segmentation.
//!
//! Separates the subject from its background with pure image
//! statistics and composites the subject over a white canvas:
//!
//! 1. Luminance conversion
//! 2. 5x5 Gaussian smoothing
//! 3. Otsu thresholding into a binary mask (255 = above the level)
//! 4. Polarity correction: the smaller class is the foreground
//! 5. Median-filter despeckle (5x5 window)
//! 6. Composite: masked pixels kept, everything else white
//!
//! Segmentation is total. A uniform image gives a degenerate threshold
//! and a mask covering none or all of the image; the output is then
//! either the white canvas or the input itself.

use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::debug;

use crate::blur::{SIGMA_5X5, gaussian_blur};
use crate::grayscale::luminance;

/// Mask value for foreground pixels.
pub const FOREGROUND: u8 = 255;

/// Mask value for background pixels.
pub const BACKGROUND: u8 = 0;

/// Median filter radius used to despeckle the mask (5x5 window).
pub const DESPECKLE_RADIUS: u32 = 2;

/// Color that replaces background pixels.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Everything the segmenter computed for one image.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// The original foreground composited over white.
    pub image: RgbImage,
    /// Final binary mask, [`FOREGROUND`] where the original was kept.
    pub mask: GrayImage,
    /// Otsu level of the smoothed luminance.
    pub threshold: u8,
    /// Whether polarity correction inverted the raw threshold mask.
    pub inverted: bool,
}

/// Segment `image`, returning only the composited result.
///
/// The output always has the same dimensions as the input.
#[must_use = "returns the segmented image"]
pub fn segment(image: &RgbImage) -> RgbImage {
    segment_with_mask(image).image
}

/// Segment `image`, keeping the mask and threshold alongside the output.
#[must_use = "returns the segmentation"]
pub fn segment_with_mask(image: &RgbImage) -> Segmentation {
    let gray = luminance(image);
    let smoothed = gaussian_blur(&gray, SIGMA_5X5);

    let threshold = otsu_level(&smoothed);
    let raw = binarize(&smoothed, threshold);
    let (oriented, inverted) = correct_polarity(raw);
    let mask = despeckle(&oriented);

    debug!(
        threshold,
        inverted,
        foreground = foreground_count(&mask),
        width = image.width(),
        height = image.height(),
        "segmented image"
    );

    Segmentation {
        image: composite_on_white(image, &mask),
        mask,
        threshold,
        inverted,
    }
}

/// Otsu's automatic threshold level.
///
/// Returns the level `t` that maximizes the between-class variance of
/// the split `{v <= t}` / `{v > t}`. Ties keep the lowest level. A
/// uniform image has no valid split and yields 0.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn otsu_level(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[usize::from(pixel.0[0])] += 1;
    }

    let total: u64 = histogram.iter().sum();
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;
    let mut weight_low = 0u64;
    let mut sum_low = 0.0f64;

    for (level, &count) in histogram.iter().enumerate() {
        weight_low += count;
        if weight_low == 0 {
            continue;
        }
        let weight_high = total - weight_low;
        if weight_high == 0 {
            break;
        }

        sum_low += level as f64 * count as f64;
        let mean_low = sum_low / weight_low as f64;
        let mean_high = (total_sum - sum_low) / weight_high as f64;
        let variance = weight_low as f64 * weight_high as f64 * (mean_low - mean_high).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Binary threshold: [`FOREGROUND`] where `gray > level`, else
/// [`BACKGROUND`].
#[must_use = "returns the binary mask"]
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > level {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Number of [`FOREGROUND`] pixels in a mask.
#[must_use]
pub fn foreground_count(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p.0[0] == FOREGROUND).map(|_| 1).sum()
}

/// Invert the mask if its foreground covers more than half the image.
///
/// The subject is assumed to be smaller than the background. Returns the
/// oriented mask and whether it was inverted.
#[must_use = "returns the oriented mask"]
pub fn correct_polarity(mask: GrayImage) -> (GrayImage, bool) {
    let area = u64::from(mask.width()) * u64::from(mask.height());
    if foreground_count(&mask) * 2 > area {
        (invert_mask(&mask), true)
    } else {
        (mask, false)
    }
}

/// Invert a binary mask (bitwise NOT).
#[must_use = "returns the inverted mask"]
pub fn invert_mask(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([!mask.get_pixel(x, y).0[0]])
    })
}

/// Remove isolated misclassified pixels with a 5x5 median filter.
#[must_use = "returns the despeckled mask"]
pub fn despeckle(mask: &GrayImage) -> GrayImage {
    imageproc::filter::median_filter(mask, DESPECKLE_RADIUS, DESPECKLE_RADIUS)
}

/// Keep `image` where `mask` is [`FOREGROUND`]; paint everything else
/// [`WHITE`].
///
/// `mask` must have the same dimensions as `image`.
#[must_use = "returns the composited image"]
pub fn composite_on_white(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    debug_assert_eq!(image.dimensions(), mask.dimensions());
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] == FOREGROUND {
            *image.get_pixel(x, y)
        } else {
            WHITE
        }
    })
}
