//! Attribute tagging: dominant color, orientation, background
//! cleanliness, and size bucket.
//!
//! The dominant color is a nearest-centroid lookup of the mean RGB value
//! in a fixed, ordered palette. Iteration order is part of the contract:
//! on equal distances the earlier entry wins.

use tracing::debug;

use crate::quality::round_to_thousandths;
use crate::types::{ColorName, Dimensions, Orientation, RgbImage, SizeCategory, TagSet};

/// Reference palette in tie-break order.
pub const PALETTE: [(ColorName, [u8; 3]); 12] = [
    (ColorName::Red, [255, 0, 0]),
    (ColorName::Orange, [255, 165, 0]),
    (ColorName::Yellow, [255, 255, 0]),
    (ColorName::Green, [0, 128, 0]),
    (ColorName::Cyan, [0, 255, 255]),
    (ColorName::Blue, [0, 0, 255]),
    (ColorName::Purple, [128, 0, 128]),
    (ColorName::Pink, [255, 192, 203]),
    (ColorName::Brown, [165, 42, 42]),
    (ColorName::Gray, [128, 128, 128]),
    (ColorName::Black, [0, 0, 0]),
    (ColorName::White, [255, 255, 255]),
];

/// Ratio above which an image is landscape.
pub const LANDSCAPE_RATIO: f64 = 1.1;

/// Ratio below which an image is portrait.
pub const PORTRAIT_RATIO: f64 = 0.9;

/// Minimum value on every channel for a pixel to count as near-white.
pub const NEAR_WHITE: u8 = 245;

/// Minimum near-white fraction for a clean background.
pub const CLEAN_BACKGROUND_RATIO: f64 = 0.6;

/// Minimum area of a medium image.
pub const MEDIUM_AREA: u64 = 1024 * 1024;

/// Minimum area of a large image.
pub const LARGE_AREA: u64 = 2048 * 2048;

/// Tag `image` with its descriptive attributes.
#[must_use = "returns the tag set"]
pub fn tag(image: &RgbImage) -> TagSet {
    let dimensions = Dimensions::of(image);
    let mean = mean_rgb(image);
    let ratio = white_ratio(image);
    let white_background_ratio = round_to_thousandths(ratio);

    let tags = TagSet {
        dominant_color: nearest_color(mean),
        mean_rgb: mean.map(round_channel),
        orientation: orientation(dimensions.aspect_ratio()),
        white_background_ratio,
        background_clean: ratio >= CLEAN_BACKGROUND_RATIO,
        size_category: size_category(dimensions.area()),
    };

    debug!(
        dominant_color = ?tags.dominant_color,
        orientation = ?tags.orientation,
        white_background_ratio,
        "tagged image"
    );

    tags
}

/// Per-channel arithmetic mean. Zero for an empty image.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_rgb(image: &RgbImage) -> [f64; 3] {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return [0.0; 3];
    }
    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, &channel) in sums.iter_mut().zip(&pixel.0) {
            *sum += u64::from(channel);
        }
    }
    sums.map(|s| s as f64 / count as f64)
}

/// Nearest palette entry by Euclidean distance; first entry wins ties.
#[must_use]
pub fn nearest_color(rgb: [f64; 3]) -> ColorName {
    let mut best = PALETTE[0].0;
    let mut best_distance = f64::INFINITY;
    for (name, reference) in PALETTE {
        let distance = squared_distance(rgb, reference);
        if distance < best_distance {
            best = name;
            best_distance = distance;
        }
    }
    best
}

fn squared_distance(rgb: [f64; 3], reference: [u8; 3]) -> f64 {
    rgb.iter()
        .zip(reference)
        .map(|(&c, r)| {
            let d = c - f64::from(r);
            d * d
        })
        .sum()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Classify a width/height ratio. `[0.9, 1.1]` is square.
#[must_use]
pub fn orientation(ratio: f64) -> Orientation {
    if ratio > LANDSCAPE_RATIO {
        Orientation::Landscape
    } else if ratio < PORTRAIT_RATIO {
        Orientation::Portrait
    } else {
        Orientation::Square
    }
}

/// Fraction of pixels whose channels are all at least [`NEAR_WHITE`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn white_ratio(image: &RgbImage) -> f64 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let white = image
        .pixels()
        .filter(|p| p.0.iter().all(|&c| c >= NEAR_WHITE))
        .count();
    white as f64 / count as f64
}

/// Bucket a pixel area.
#[must_use]
pub const fn size_category(area: u64) -> SizeCategory {
    if area >= LARGE_AREA {
        SizeCategory::Large
    } else if area >= MEDIUM_AREA {
        SizeCategory::Medium
    } else {
        SizeCategory::Small
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_boundaries() {
        assert_eq!(orientation(1.0), Orientation::Square);
        assert_eq!(orientation(1.2), Orientation::Landscape);
        assert_eq!(orientation(0.8), Orientation::Portrait);
        assert_eq!(orientation(1.05), Orientation::Square);
        assert_eq!(orientation(1.1), Orientation::Square);
        assert_eq!(orientation(0.9), Orientation::Square);
    }

    #[test]
    fn orientation_from_image_shape() {
        assert_eq!(tag(&RgbImage::new(12, 10)).orientation, Orientation::Landscape);
        assert_eq!(tag(&RgbImage::new(8, 10)).orientation, Orientation::Portrait);
        assert_eq!(tag(&RgbImage::new(10, 10)).orientation, Orientation::Square);
    }

    #[test]
    fn palette_entries_map_to_themselves() {
        for (name, rgb) in PALETTE {
            assert_eq!(nearest_color(rgb.map(f64::from)), name);
        }
    }

    #[test]
    fn ties_keep_first_palette_entry() {
        // Midpoint of red and orange.
        assert_eq!(nearest_color([255.0, 82.5, 0.0]), ColorName::Red);
        assert_eq!(nearest_color([255.0, 82.6, 0.0]), ColorName::Orange);
    }

    #[test]
    fn nearest_color_is_deterministic() {
        let samples = [[10.0, 200.0, 30.0], [250.0, 250.0, 250.0], [140.0, 60.0, 40.0]];
        let first: Vec<_> = samples.iter().map(|&s| nearest_color(s)).collect();
        let second: Vec<_> = samples.iter().rev().map(|&s| nearest_color(s)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
        assert_eq!(first, [ColorName::Green, ColorName::White, ColorName::Brown]);
    }

    #[test]
    fn mean_rgb_is_rounded() {
        let img = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgb([0, 10, 255])
            } else {
                image::Rgb([1, 11, 254])
            }
        });
        assert_eq!(tag(&img).mean_rgb, [1, 11, 255]);
    }

    #[test]
    fn mostly_white_image_has_clean_background() {
        // 7 of 10 pixels near-white.
        let img = RgbImage::from_fn(10, 1, |x, _| {
            if x < 7 {
                image::Rgb([250, 245, 255])
            } else {
                image::Rgb([10, 10, 10])
            }
        });
        let tags = tag(&img);
        assert!((tags.white_background_ratio - 0.7).abs() < 1e-12);
        assert!(tags.background_clean);
    }

    #[test]
    fn near_white_requires_every_channel() {
        let img = RgbImage::from_pixel(3, 3, image::Rgb([255, 255, 244]));
        let tags = tag(&img);
        assert!(tags.white_background_ratio.abs() < f64::EPSILON);
        assert!(!tags.background_clean);
    }

    #[test]
    fn clean_background_threshold_is_inclusive() {
        let img = RgbImage::from_fn(5, 1, |x, _| {
            if x < 3 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        assert!(tag(&img).background_clean);
    }

    #[test]
    fn clean_background_uses_unrounded_ratio() {
        // 5996 of 10000 pixels white: reported as 0.6, but below the cut.
        let img = RgbImage::from_fn(100, 100, |x, y| {
            if y * 100 + x < 5996 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let tags = tag(&img);
        assert!((tags.white_background_ratio - 0.6).abs() < f64::EPSILON);
        assert!(!tags.background_clean);
    }

    #[test]
    fn size_buckets() {
        assert_eq!(size_category(0), SizeCategory::Small);
        assert_eq!(size_category(MEDIUM_AREA - 1), SizeCategory::Small);
        assert_eq!(size_category(MEDIUM_AREA), SizeCategory::Medium);
        assert_eq!(size_category(LARGE_AREA - 1), SizeCategory::Medium);
        assert_eq!(size_category(LARGE_AREA), SizeCategory::Large);
    }

    #[test]
    fn degenerate_images_are_tagged() {
        let black = tag(&RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0])));
        assert_eq!(black.dominant_color, ColorName::Black);
        let white = tag(&RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])));
        assert_eq!(white.dominant_color, ColorName::White);
        assert!((white.white_background_ratio - 1.0).abs() < f64::EPSILON);
    }
}
