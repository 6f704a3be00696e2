//! Local persistence of segmented images.
//!
//! Writes each output as `<uuid>.png` into a configured directory and
//! returns the file path as its location. With no directory configured,
//! nothing is written and the location is `None`.
//!
//! [`public_url`] is the consuming layer's translation of an on-disk
//! location into the path it serves the file under.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use kensa_pipeline::{ImageSink, RgbImage};
use tracing::info;
use uuid::Uuid;

/// Environment variable naming the storage directory.
pub const STORAGE_ENV: &str = "STORAGE_DIR";

/// Extension of every stored image.
pub const OUTPUT_EXTENSION: &str = "png";

/// Path prefix under which stored outputs are served.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/outputs";

/// Errors from writing an output image.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage directory could not be created.
    #[error("failed to create storage directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The image could not be encoded or written.
    #[error("failed to write output image {}: {source}", path.display())]
    Write {
        /// Target file path.
        path: PathBuf,
        /// Underlying encoder or I/O error.
        #[source]
        source: image::ImageError,
    },
}

/// Filesystem-backed [`ImageSink`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalStorage {
    dir: Option<PathBuf>,
}

impl LocalStorage {
    /// Storage writing into `dir`, created on first save if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Storage that never writes.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    /// Storage configured by [`STORAGE_ENV`]; disabled when unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(STORAGE_ENV))
    }

    /// Resolve storage from an already-read environment value.
    /// Unset and empty both disable storage.
    #[must_use]
    pub fn from_env_value(value: Option<OsString>) -> Self {
        value
            .filter(|v| !v.is_empty())
            .map_or_else(Self::disabled, Self::new)
    }

    /// The configured directory, if any.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write `image` as a new PNG and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::CreateDir`] if the directory cannot be
    /// created and [`StorageError::Write`] if encoding or writing fails.
    pub fn save_image(&self, image: &RgbImage) -> Result<Option<PathBuf>, StorageError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        std::fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(output_file_name());
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), "stored segmented image");
        Ok(Some(path))
    }
}

impl ImageSink for LocalStorage {
    type Error = StorageError;

    fn save(&self, image: &RgbImage) -> Result<Option<String>, StorageError> {
        Ok(self
            .save_image(image)?
            .map(|path| path.to_string_lossy().into_owned()))
    }
}

/// A fresh collision-resistant file name: 128 random bits as hex plus
/// [`OUTPUT_EXTENSION`].
#[must_use]
pub fn output_file_name() -> String {
    format!("{}.{OUTPUT_EXTENSION}", Uuid::new_v4().simple())
}

/// Map a stored file location to `<prefix>/<file name>`.
///
/// Returns `None` if the file does not exist or has no UTF-8 file name.
#[must_use]
pub fn public_url(location: &str, prefix: &str) -> Option<String> {
    let path = Path::new(location);
    if !path.is_file() {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    Some(format!("{}/{name}", prefix.trim_end_matches('/')))
}
