//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! [`crate::process`] runs the whole sequence in one call. [`Pipeline`]
//! lets the caller drive it one step at a time:
//!
//! ```rust
//! # use kensa_pipeline::{Pipeline, RgbImage, ThresholdSet};
//! let image = RgbImage::from_pixel(8, 8, image::Rgb([200, 200, 200]));
//! let thresholds = ThresholdSet::default();
//! let tagged = Pipeline::new(&image, &thresholds)
//!     .segment()
//!     .assess()
//!     .tag();
//!
//! assert!(tagged.tags().background_clean);
//! let result = tagged.into_result(None);
//! assert_eq!(result.width, 8);
//! ```
//!
//! Each stage method consumes `self` and returns the next state,
//! carrying the segmented image forward. The order is fixed:
//! segment, then assess, then tag, then optionally persist. Quality and
//! tags are both measured on the segmented image, never the original.

use crate::segment::Segmentation;
use crate::sink::ImageSink;
use crate::types::{
    Dimensions, PipelineError, PipelineResult, QaReport, QaSummary, RgbImage, RunStatus,
    SegmentationSummary, TagSet, ThresholdSet,
};

/// Entry point of the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a run on `image` with `thresholds`.
    ///
    /// `image` must be non-empty; decoding rejects zero-area input
    /// before it gets here.
    pub fn new<'a>(image: &'a RgbImage, thresholds: &'a ThresholdSet) -> Pending<'a> {
        Pending { image, thresholds }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing — call .segment() to continue"]
pub struct Pending<'a> {
    image: &'a RgbImage,
    thresholds: &'a ThresholdSet,
}

impl<'a> Pending<'a> {
    /// The original image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        self.image
    }

    /// Segment the image and advance to [`Segmented`].
    pub fn segment(self) -> Segmented<'a> {
        Segmented {
            original: Dimensions::of(self.image),
            thresholds: self.thresholds,
            segmentation: crate::segment::segment_with_mask(self.image),
        }
    }
}

// ───────────────────────── Stage 1: Segmented ────────────────────────

/// Pipeline state after foreground/background segmentation.
#[must_use = "pipeline stages are consumed by advancing — call .assess() to continue"]
pub struct Segmented<'a> {
    original: Dimensions,
    thresholds: &'a ThresholdSet,
    segmentation: Segmentation,
}

impl Segmented<'_> {
    /// The full segmentation output (image, mask, threshold).
    #[must_use]
    pub const fn segmentation(&self) -> &Segmentation {
        &self.segmentation
    }

    /// Assess quality of the segmented image and advance to [`Assessed`].
    pub fn assess(self) -> Assessed {
        let qa = crate::quality::assess(&self.segmentation.image, self.thresholds);
        Assessed {
            original: self.original,
            segmentation: self.segmentation,
            qa,
        }
    }
}

// ───────────────────────── Stage 2: Assessed ─────────────────────────

/// Pipeline state after quality assessment.
#[must_use = "pipeline stages are consumed by advancing — call .tag() to continue"]
pub struct Assessed {
    original: Dimensions,
    segmentation: Segmentation,
    qa: QaReport,
}

impl Assessed {
    /// The segmented image.
    #[must_use]
    pub const fn segmented(&self) -> &RgbImage {
        &self.segmentation.image
    }

    /// The quality report.
    #[must_use]
    pub const fn qa(&self) -> &QaReport {
        &self.qa
    }

    /// Tag the segmented image and advance to [`Tagged`].
    pub fn tag(self) -> Tagged {
        let tags = crate::tag::tag(&self.segmentation.image);
        Tagged {
            original: self.original,
            segmentation: self.segmentation,
            qa: self.qa,
            tags,
        }
    }
}

// ───────────────────────── Stage 3: Tagged ───────────────────────────

/// Final computed state: every measurement is done.
///
/// Finish with [`into_result`](Self::into_result) to skip persistence,
/// or [`persist`](Self::persist) to hand the segmented image to a sink.
#[must_use = "call .into_result() or .persist() to obtain the result"]
pub struct Tagged {
    original: Dimensions,
    segmentation: Segmentation,
    qa: QaReport,
    tags: TagSet,
}

impl Tagged {
    /// The segmented image.
    #[must_use]
    pub const fn segmented(&self) -> &RgbImage {
        &self.segmentation.image
    }

    /// The quality report.
    #[must_use]
    pub const fn qa(&self) -> &QaReport {
        &self.qa
    }

    /// The attribute tags.
    #[must_use]
    pub const fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Consume the stage and return the segmentation output.
    #[must_use]
    pub fn into_segmentation(self) -> Segmentation {
        self.segmentation
    }

    /// Assemble the result record with the given output location.
    #[must_use]
    pub fn into_result(self, output_url: Option<String>) -> PipelineResult {
        let background_clean = self.tags.background_clean;
        PipelineResult {
            status: RunStatus::Ok,
            width: self.original.width,
            height: self.original.height,
            tags: self.tags,
            qa: QaSummary::from(self.qa),
            output_url,
            segmentation: SegmentationSummary { background_clean },
        }
    }

    /// Save the segmented image through `sink`, then assemble the result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persist`] if the sink fails to write.
    pub fn persist<S: ImageSink>(self, sink: &S) -> Result<PipelineResult, PipelineError> {
        let output_url = sink
            .save(&self.segmentation.image)
            .map_err(|e| PipelineError::Persist(Box::new(e)))?;
        Ok(self.into_result(output_url))
    }
}
