//! kensa-io: Filesystem and environment I/O for the kensa pipeline.
//!
//! Resolves QA thresholds from an optional JSON document and stores
//! segmented output images on local disk. The pipeline itself stays
//! sans-IO; everything here is a collaborator it is handed.

pub mod config;
pub mod storage;

pub use config::{ConfigError, ThresholdSource, resolve};
pub use storage::{LocalStorage, StorageError, public_url};
