//! Integration test: encode the reference scene as PNG, decode it, and run
//! the full pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kensa_pipeline::{
    Orientation, QaStatus, RgbImage, SizeCategory, ThresholdSet, decode, process,
    segment,
};

/// 128x128 (210,210,210) background with a (30,30,30) square covering the
/// middle half.
fn reference_png() -> Vec<u8> {
    let img = RgbImage::from_fn(128, 128, |x, y| {
        if (32..96).contains(&x) && (32..96).contains(&y) {
            image::Rgb([30, 30, 30])
        } else {
            image::Rgb([210, 210, 210])
        }
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();
    buf
}

#[test]
fn reference_scene_end_to_end() {
    let image = decode(&reference_png()).expect("reference PNG should decode");
    let result = process(&image, &ThresholdSet::default());

    eprintln!("{}", serde_json::to_string_pretty(&result).unwrap());

    assert!(!result.qa.report.min_size_ok, "16384 px < 262144 px");
    assert!(result.qa.report.blur_ok, "square edges are sharp");
    assert!(result.qa.report.brightness_ok);
    assert_eq!(result.qa.status, QaStatus::Review);

    assert_eq!(result.tags.orientation, Orientation::Square);
    assert_eq!(result.tags.size_category, SizeCategory::Small);
    assert!(result.tags.background_clean);
    assert!(result.tags.white_background_ratio >= 0.6);
}

#[test]
fn reference_scene_segmentation() {
    let image = decode(&reference_png()).unwrap();
    let segmented = segment(&image);
    assert_eq!(segmented.dimensions(), image.dimensions());

    let mean = |p: &image::Rgb<u8>| p.0.iter().map(|&c| f64::from(c)).sum::<f64>() / 3.0;
    assert!(mean(segmented.get_pixel(0, 0)) >= 200.0);
    assert!(mean(segmented.get_pixel(64, 64)) < 100.0);
}

#[test]
fn lowering_area_threshold_passes_reference_scene() {
    let image = decode(&reference_png()).unwrap();
    let thresholds = ThresholdSet {
        min_pixels: 128 * 128,
        ..ThresholdSet::default()
    };
    let result = process(&image, &thresholds);
    assert!(result.qa.report.min_size_ok);
    assert_eq!(result.qa.status, QaStatus::Pass);
}
