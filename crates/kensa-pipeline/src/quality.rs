//! Quality assessment: resolution, sharpness, and brightness checks.
//!
//! The sharpness proxy is the variance of the 4-neighbour Laplacian
//! response on luminance. It is not normalized by resolution, so larger
//! images tend to score higher; thresholds are compared against the raw
//! value.
//!
//! Assessment never fails. It measures and classifies; the overall
//! pass/review verdict is derived by the orchestrator via
//! [`QaStatus::from_report`](crate::types::QaStatus::from_report).

use image::GrayImage;
use tracing::debug;

use crate::grayscale::{luminance, mean_luminance};
use crate::types::{Dimensions, QaReport, RgbImage, ThresholdSet};

/// Assess `image` against `thresholds`.
#[must_use = "returns the QA report"]
pub fn assess(image: &RgbImage, thresholds: &ThresholdSet) -> QaReport {
    let dimensions = Dimensions::of(image);
    let gray = luminance(image);

    let blur_score = laplacian_variance(&gray);
    let brightness = mean_luminance(&gray);

    let report = QaReport {
        min_size_ok: dimensions.area() >= thresholds.min_pixels,
        blur_score,
        blur_ok: blur_score >= thresholds.blur_threshold,
        brightness,
        brightness_ok: (thresholds.min_brightness..=thresholds.max_brightness)
            .contains(&brightness),
        width: dimensions.width,
        height: dimensions.height,
        aspect_ratio: round_to_thousandths(dimensions.aspect_ratio()),
    };

    debug!(
        blur_score,
        brightness,
        min_size_ok = report.min_size_ok,
        blur_ok = report.blur_ok,
        brightness_ok = report.brightness_ok,
        "assessed image quality"
    );

    report
}

/// Population variance of the Laplacian response.
///
/// Kernel `[0, 1, 0; 1, -4, 1; 0, 1, 0]`, with borders mirrored without
/// repeating the edge pixel (`dcb|abcd|cba`). Returns 0.0 for an empty
/// image.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return 0.0;
    }

    let at = |x: i64, y: i64| -> i64 {
        let x = reflect101(x, i64::from(width));
        let y = reflect101(y, i64::from(height));
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let value = gray.get_pixel(x as u32, y as u32).0[0];
        i64::from(value)
    };

    // Running sums stay exact: |response| <= 1020 for 8-bit input.
    let mut sum = 0i64;
    let mut sum_sq = 0i128;
    for y in 0..i64::from(height) {
        for x in 0..i64::from(width) {
            let response = at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4 * at(x, y);
            sum += response;
            sum_sq += i128::from(response * response);
        }
    }

    let n = count as f64;
    let mean = sum as f64 / n;
    (sum_sq as f64 / n - mean * mean).max(0.0)
}

/// Mirror an out-of-range index back into `0..len` without repeating
/// the border element.
const fn reflect101(i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    if i < 0 {
        -i
    } else if i >= len {
        2 * len - 2 - i
    } else {
        i
    }
}

/// Round to 3 decimal places.
#[must_use]
pub fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
