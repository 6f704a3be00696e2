//! Gaussian smoothing before thresholding.
//!
//! A fixed 5x5 separable Gaussian pass, run through
//! [`imageproc::filter::separable_filter_equal`], suppresses pixel noise
//! that would otherwise split the luminance histogram and scatter
//! misclassified pixels through the segmentation mask.

use image::GrayImage;

/// Sigma of the 5x5 kernel under automatic sigma selection:
/// `0.3 * ((5 - 1) * 0.5 - 1) + 0.8`.
pub const SIGMA_5X5: f32 = 1.1;

/// Tap offsets of the 5-wide kernel.
const OFFSETS: [f32; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];

/// Normalized 5-tap Gaussian weights for `sigma`.
///
/// `imageproc::filter::gaussian_blur_f32` widens its kernel with sigma
/// (radius `ceil(2 * sigma)`), so the width is pinned here instead.
#[must_use]
pub fn gaussian_kernel_5(sigma: f32) -> [f32; 5] {
    let weights = OFFSETS.map(|x| (-x * x / (2.0 * sigma * sigma)).exp());
    let sum: f32 = weights.iter().sum();
    weights.map(|w| w / sum)
}

/// Apply a 5x5 Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    imageproc::filter::separable_filter_equal(image, &gaussian_kernel_5(sigma))
}
