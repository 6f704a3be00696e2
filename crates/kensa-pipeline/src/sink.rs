//! Persistence seam for the segmented output image.
//!
//! The pipeline never touches storage itself. A caller that wants the
//! cleaned image kept somewhere passes an [`ImageSink`]; the returned
//! location is copied into [`PipelineResult::output_url`] verbatim.
//!
//! [`PipelineResult::output_url`]: crate::types::PipelineResult::output_url

use std::convert::Infallible;

use crate::types::RgbImage;

/// Destination for segmented images.
pub trait ImageSink {
    /// Failure type of a write that was attempted.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `image`.
    ///
    /// Returns `Ok(None)` when no destination is configured. That is a
    /// valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when a configured destination could not be
    /// written.
    fn save(&self, image: &RgbImage) -> Result<Option<String>, Self::Error>;
}

/// A sink that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSink;

impl ImageSink for NoSink {
    type Error = Infallible;

    fn save(&self, _image: &RgbImage) -> Result<Option<String>, Infallible> {
        Ok(None)
    }
}

impl<S: ImageSink + ?Sized> ImageSink for &S {
    type Error = S::Error;

    fn save(&self, image: &RgbImage) -> Result<Option<String>, Self::Error> {
        (**self).save(image)
    }
}
