//! kensa-pipeline: Pure image inspection pipeline (sans-IO).
//!
//! Turns one decoded RGB image into a structured verdict through:
//! segmentation -> quality assessment -> attribute tagging ->
//! optional persistence.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns structured data. Threshold loading and output
//! storage live in `kensa-io`.

pub mod blur;
pub mod grayscale;
pub mod pipeline;
pub mod quality;
pub mod segment;
pub mod sink;
pub mod tag;
pub mod types;

pub use grayscale::decode;
pub use pipeline::Pipeline;
pub use segment::{Segmentation, segment};
pub use sink::{ImageSink, NoSink};
pub use types::{
    ColorName, Dimensions, GrayImage, Orientation, PipelineError, PipelineResult, QaReport,
    QaStatus, QaSummary, RgbImage, RunStatus, SegmentationSummary, SizeCategory, TagSet,
    ThresholdSet,
};

/// Run the full inspection pipeline without persistence.
///
/// A pure function of `(image, thresholds)`: running it twice on the same
/// image yields identical results. `output_url` is always `None`.
///
/// `image` must be non-empty (see [`decode`]).
///
/// # Pipeline steps
///
/// 1. Segment foreground from background (white composite)
/// 2. Assess quality of the segmented image
/// 3. Tag attributes of the segmented image
/// 4. Assemble the result (dimensions from the original image)
#[must_use = "returns the pipeline result"]
pub fn process(image: &RgbImage, thresholds: &ThresholdSet) -> PipelineResult {
    Pipeline::new(image, thresholds)
        .segment()
        .assess()
        .tag()
        .into_result(None)
}

/// Run the full inspection pipeline and persist the segmented image.
///
/// # Errors
///
/// Returns [`PipelineError::Persist`] if `sink` fails to write. The
/// computation stages themselves cannot fail.
pub fn process_with_sink<S: ImageSink>(
    image: &RgbImage,
    thresholds: &ThresholdSet,
    sink: &S,
) -> Result<PipelineResult, PipelineError> {
    Pipeline::new(image, thresholds)
        .segment()
        .assess()
        .tag()
        .persist(sink)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 128x128 light gray background with a dark centered square.
    fn reference_image() -> RgbImage {
        RgbImage::from_fn(128, 128, |x, y| {
            if (32..96).contains(&x) && (32..96).contains(&y) {
                image::Rgb([30, 30, 30])
            } else {
                image::Rgb([210, 210, 210])
            }
        })
    }

    #[test]
    fn process_reference_scenario() {
        let result = process(&reference_image(), &ThresholdSet::default());
        assert_eq!(result.status, RunStatus::Ok);
        assert_eq!((result.width, result.height), (128, 128));
        assert!(!result.qa.report.min_size_ok);
        assert_eq!(result.tags.orientation, Orientation::Square);
        assert!(result.tags.background_clean);
        assert!(result.segmentation.background_clean);
        assert_eq!(result.qa.status, QaStatus::Review);
        assert!(result.output_url.is_none());
    }

    #[test]
    fn process_is_idempotent() {
        let img = reference_image();
        let thresholds = ThresholdSet::default();
        assert_eq!(process(&img, &thresholds), process(&img, &thresholds));
    }

    #[test]
    fn process_with_no_sink_matches_process() {
        let img = reference_image();
        let thresholds = ThresholdSet::default();
        let persisted = process_with_sink(&img, &thresholds, &NoSink).unwrap();
        assert_eq!(persisted, process(&img, &thresholds));
    }

    #[test]
    fn degenerate_images_never_fail() {
        let thresholds = ThresholdSet::default();
        for img in [
            RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0])),
            RgbImage::from_pixel(9, 3, image::Rgb([255, 255, 255])),
            RgbImage::from_pixel(5, 5, image::Rgb([0, 0, 0])),
        ] {
            let result = process(&img, &thresholds);
            assert_eq!(result.qa.status, QaStatus::Review);
            assert_eq!((result.width, result.height), img.dimensions());
        }
    }

    #[test]
    fn result_serializes_to_documented_shape() {
        let result = process(&reference_image(), &ThresholdSet::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["width"], 128);
        assert!(json["output_url"].is_null());
        assert_eq!(json["segmentation"]["background_clean"], true);
        for key in [
            "min_size_ok",
            "blur_score",
            "blur_ok",
            "brightness",
            "brightness_ok",
            "width",
            "height",
            "aspect_ratio",
            "status",
        ] {
            assert!(json["qa"].get(key).is_some(), "qa missing {key}");
        }
        for key in [
            "dominant_color",
            "mean_rgb",
            "orientation",
            "white_background_ratio",
            "background_clean",
            "size_category",
        ] {
            assert!(json["tags"].get(key).is_some(), "tags missing {key}");
        }
        let back: PipelineResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
