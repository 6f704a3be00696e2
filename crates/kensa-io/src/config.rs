//! Threshold configuration loading.
//!
//! Resolves the QA [`ThresholdSet`] from an optional JSON document,
//! falling back to the built-in defaults. The document has a single
//! recognized top-level key:
//!
//! ```json
//! { "qa": { "min_pixels": 262144, "blur_threshold": 80.0,
//!           "min_brightness": 35.0, "max_brightness": 230.0 } }
//! ```
//!
//! Any subset of the four keys may be present. Only numeric values are
//! merged; everything else in the document is ignored.
//!
//! A missing, unreadable, or malformed document is not an error for the
//! caller of [`ThresholdSource::load`] or [`resolve`]: the failure is
//! logged and the defaults are used. [`ThresholdSource::try_load`]
//! exposes the typed failure for callers that want it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use kensa_pipeline::ThresholdSet;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Environment variable naming the threshold document.
pub const CONFIG_ENV: &str = "KENSA_QA_CONFIG";

/// Threshold document path used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "configs/qa.json";

/// Top-level key holding the QA thresholds.
pub const QA_KEY: &str = "qa";

/// Errors from reading or parsing a threshold document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("failed to read threshold config {}: {source}", path.display())]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON.
    #[error("failed to parse threshold config {}: {source}", path.display())]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Returns `true` if the document simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Location of a threshold document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSource {
    path: PathBuf,
}

impl ThresholdSource {
    /// A source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The source named by [`CONFIG_ENV`], or [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(CONFIG_ENV))
    }

    /// Resolve the source from an already-read environment value.
    /// Unset and empty both select [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn from_env_value(value: Option<OsString>) -> Self {
        value
            .filter(|v| !v.is_empty())
            .map_or_else(|| Self::new(DEFAULT_CONFIG_PATH), Self::new)
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and merge the document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid JSON. A valid JSON
    /// document of the wrong shape is not an error.
    pub fn try_load(&self) -> Result<ThresholdSet, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_document(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`try_load`](Self::try_load), but any failure yields the
    /// defaults.
    #[must_use]
    pub fn load(&self) -> ThresholdSet {
        match self.try_load() {
            Ok(thresholds) => {
                info!(path = %self.path.display(), ?thresholds, "loaded QA thresholds");
                thresholds
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %self.path.display(), "no threshold config, using defaults");
                ThresholdSet::default()
            }
            Err(e) => {
                warn!(error = %e, "using default QA thresholds");
                ThresholdSet::default()
            }
        }
    }
}

/// Parse a threshold document and merge it over the defaults.
///
/// # Errors
///
/// Returns the JSON error if `text` is not valid JSON.
pub fn parse_document(text: &str) -> Result<ThresholdSet, serde_json::Error> {
    let document: Value = serde_json::from_str(text)?;
    Ok(merge(&ThresholdSet::default(), &document))
}

/// Merge the numeric entries of `document["qa"]` over `base`.
///
/// Non-numeric values, negative pixel counts, and unknown keys are
/// skipped. If the merged brightness bounds end up inverted, both bounds
/// revert to `base`'s.
#[must_use]
pub fn merge(base: &ThresholdSet, document: &Value) -> ThresholdSet {
    let mut merged = base.clone();
    let Some(overrides) = document.get(QA_KEY).and_then(Value::as_object) else {
        return merged;
    };

    for (key, value) in overrides {
        let accepted = match key.as_str() {
            "min_pixels" => apply(&mut merged.min_pixels, pixel_count(value)),
            "blur_threshold" => apply(&mut merged.blur_threshold, value.as_f64()),
            "min_brightness" => apply(&mut merged.min_brightness, value.as_f64()),
            "max_brightness" => apply(&mut merged.max_brightness, value.as_f64()),
            other => {
                debug!(key = other, "ignoring unknown threshold key");
                continue;
            }
        };
        if !accepted {
            warn!(key = key.as_str(), %value, "ignoring non-numeric threshold override");
        }
    }

    if !merged.has_ordered_brightness() {
        warn!(
            min_brightness = merged.min_brightness,
            max_brightness = merged.max_brightness,
            "brightness bounds inverted, reverting to defaults"
        );
        merged.min_brightness = base.min_brightness;
        merged.max_brightness = base.max_brightness;
    }

    merged
}

fn apply<T>(slot: &mut T, value: Option<T>) -> bool {
    let Some(value) = value else {
        return false;
    };
    *slot = value;
    true
}

/// A non-negative pixel count. Fractional values are truncated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

/// Process-wide thresholds, resolved from [`ThresholdSource::from_env`]
/// on first use.
///
/// Concurrent first calls converge on a single value; later calls return
/// it without touching the filesystem. There is no invalidation. Callers
/// that need a different document should build a [`ThresholdSource`] and
/// pass the loaded set explicitly.
pub fn resolve() -> &'static ThresholdSet {
    static RESOLVED: OnceLock<ThresholdSet> = OnceLock::new();
    RESOLVED.get_or_init(|| ThresholdSource::from_env().load())
}
