//! Shared types for the kensa inspection pipeline.
//!
//! Every record produced by the pipeline has a fixed shape with named,
//! typed fields. The serde representation of [`PipelineResult`] is the
//! JSON document served to API consumers.

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can hand images to the
/// pipeline without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for the segmentation mask.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an RGB image.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width divided by height, with the height clamped to at least 1.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

/// Numeric thresholds used by the quality assessor.
///
/// Resolved once (built-in defaults merged with an optional override
/// document) and treated as read-only thereafter. Pass it by reference
/// into every pipeline run.
///
/// # Invariant
///
/// `min_brightness <= max_brightness`. The loader in `kensa-io` reverts
/// both bounds to their defaults when an override document breaks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Minimum acceptable `width * height`.
    pub min_pixels: u64,

    /// Lower bound on the Laplacian-variance blur score for an image to
    /// count as sharp. Not normalized by resolution.
    pub blur_threshold: f64,

    /// Inclusive lower bound on mean luminance.
    pub min_brightness: f64,

    /// Inclusive upper bound on mean luminance.
    pub max_brightness: f64,
}

impl ThresholdSet {
    /// Default minimum area: a 512x512 image.
    pub const DEFAULT_MIN_PIXELS: u64 = 512 * 512;
    /// Default blur threshold.
    pub const DEFAULT_BLUR_THRESHOLD: f64 = 80.0;
    /// Default lower brightness bound.
    pub const DEFAULT_MIN_BRIGHTNESS: f64 = 35.0;
    /// Default upper brightness bound.
    pub const DEFAULT_MAX_BRIGHTNESS: f64 = 230.0;

    /// Returns `true` if the brightness bounds are ordered.
    #[must_use]
    pub fn has_ordered_brightness(&self) -> bool {
        self.min_brightness <= self.max_brightness
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            min_pixels: Self::DEFAULT_MIN_PIXELS,
            blur_threshold: Self::DEFAULT_BLUR_THRESHOLD,
            min_brightness: Self::DEFAULT_MIN_BRIGHTNESS,
            max_brightness: Self::DEFAULT_MAX_BRIGHTNESS,
        }
    }
}

/// Output of the quality assessor.
///
/// Field order matches the serialized `qa` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    /// `width * height >= min_pixels`.
    pub min_size_ok: bool,
    /// Variance of the Laplacian response on luminance.
    pub blur_score: f64,
    /// `blur_score >= blur_threshold`.
    pub blur_ok: bool,
    /// Mean luminance in `[0, 255]`.
    pub brightness: f64,
    /// `min_brightness <= brightness <= max_brightness`.
    pub brightness_ok: bool,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// `width / max(height, 1)`, rounded to 3 decimals.
    pub aspect_ratio: f64,
}

/// Overall QA verdict. QA never fails a run; it only classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaStatus {
    /// Every check passed.
    Pass,
    /// At least one check failed; a human should look at the image.
    Review,
}

impl QaStatus {
    /// `Pass` iff all three checks in `report` are true.
    #[must_use]
    pub const fn from_report(report: &QaReport) -> Self {
        if report.min_size_ok && report.blur_ok && report.brightness_ok {
            Self::Pass
        } else {
            Self::Review
        }
    }
}

/// A [`QaReport`] with its derived status appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaSummary {
    /// The individual measurements and checks.
    #[serde(flatten)]
    pub report: QaReport,
    /// Derived verdict.
    pub status: QaStatus,
}

impl From<QaReport> for QaSummary {
    fn from(report: QaReport) -> Self {
        let status = QaStatus::from_report(&report);
        Self { report, status }
    }
}

/// The closed set of named reference colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    Brown,
    Gray,
    Black,
    White,
}

/// Aspect-ratio class of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Ratio above 1.1.
    Landscape,
    /// Ratio below 0.9.
    Portrait,
    /// Ratio within `[0.9, 1.1]`.
    Square,
}

/// Pixel-area bucket of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeCategory {
    /// Below 1024x1024 pixels.
    Small,
    /// At least 1024x1024 pixels.
    Medium,
    /// At least 2048x2048 pixels.
    Large,
}

/// Output of the attribute tagger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    /// Palette entry nearest to the mean color.
    pub dominant_color: ColorName,
    /// Per-channel mean, rounded to integers.
    pub mean_rgb: [u8; 3],
    /// Aspect-ratio class.
    pub orientation: Orientation,
    /// Fraction of near-white pixels, rounded to 3 decimals.
    pub white_background_ratio: f64,
    /// `white_background_ratio >= 0.6`.
    pub background_clean: bool,
    /// Pixel-area bucket.
    pub size_category: SizeCategory,
}

/// Segmentation block of the output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationSummary {
    /// Mirrors [`TagSet::background_clean`].
    pub background_clean: bool,
}

/// Top-level status of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The pipeline completed.
    #[default]
    Ok,
}

/// Result of running the full inspection pipeline on one image.
///
/// Ownership passes to the caller for serialization. `width` and
/// `height` describe the original (pre-segmentation) image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Always [`RunStatus::Ok`] for a completed run.
    pub status: RunStatus,
    /// Original image width.
    pub width: u32,
    /// Original image height.
    pub height: u32,
    /// Attribute tags of the segmented image.
    pub tags: TagSet,
    /// Quality report of the segmented image, with status.
    pub qa: QaSummary,
    /// Location of the persisted segmented image, if one was written.
    pub output_url: Option<String>,
    /// Segmentation summary.
    pub segmentation: SegmentationSummary,
}

/// Errors that can occur around the pipeline.
///
/// The stages themselves are total; only decoding and persistence fail.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The decoded image has no pixels.
    #[error("image has zero area ({width}x{height})")]
    ZeroArea {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// Writing the segmented image failed.
    #[error("failed to persist output image: {0}")]
    Persist(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
