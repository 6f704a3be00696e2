//! kensa: inspect product images from the command line.
//!
//! Decodes each input image, runs the inspection pipeline
//! (segment -> QA -> tag), optionally stores the segmented output, and
//! prints the result record as JSON on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kensa -- [OPTIONS] <IMAGES>...
//! ```
//!
//! One image prints its result record. Several images print a batch
//! record `{job_id, status, results, errors}`; they are processed
//! concurrently and reported in argument order.

#![allow(clippy::print_stdout)]

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use kensa_io::storage::DEFAULT_PUBLIC_PREFIX;
use kensa_io::{LocalStorage, ThresholdSource, public_url};
use kensa_pipeline::{PipelineError, PipelineResult, ThresholdSet, process_with_sink};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Automated visual inspection of product images.
///
/// Segments each image onto a white background, checks resolution,
/// sharpness and brightness, and tags color, orientation and size.
#[derive(Parser)]
#[command(name = "kensa", version)]
struct Cli {
    /// Input images (PNG, JPEG, BMP, WebP).
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// QA threshold document (JSON). Defaults to `$KENSA_QA_CONFIG`, then
    /// `configs/qa.json`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for segmented outputs. Defaults to `$STORAGE_DIR`.
    #[arg(long, value_name = "DIR", conflicts_with = "no_save")]
    storage_dir: Option<PathBuf>,

    /// Do not store segmented outputs.
    #[arg(long)]
    no_save: bool,

    /// Path prefix that stored outputs are served under.
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_PUBLIC_PREFIX)]
    public_prefix: String,

    /// Print single-line JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Failure to inspect one input.
#[derive(Debug, thiserror::Error)]
enum InspectError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Pipeline {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },

    #[error("worker inspecting {} panicked", path.display())]
    Panicked { path: PathBuf },
}

/// Outcome of a multi-image run.
#[derive(Debug, Serialize)]
struct BatchReport {
    job_id: String,
    status: BatchStatus,
    results: Vec<PipelineResult>,
    errors: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum BatchStatus {
    /// Every image was inspected.
    Completed,
    /// Some images failed; see `errors`.
    Partial,
}

#[derive(Debug, Serialize)]
struct BatchFailure {
    input: String,
    error: String,
}

/// Shared, read-only context for every inspection in a run.
struct Inspector<'a> {
    thresholds: &'a ThresholdSet,
    storage: &'a LocalStorage,
    public_prefix: &'a str,
}

impl Inspector<'_> {
    /// Decode, inspect and optionally store one image.
    fn inspect(&self, path: &Path) -> Result<PipelineResult, InspectError> {
        let bytes = std::fs::read(path).map_err(|source| InspectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let pipeline_err = |source| InspectError::Pipeline {
            path: path.to_path_buf(),
            source,
        };

        let image = kensa_pipeline::decode(&bytes).map_err(pipeline_err)?;
        let mut result =
            process_with_sink(&image, self.thresholds, self.storage).map_err(pipeline_err)?;

        result.output_url = result
            .output_url
            .map(|location| public_url(&location, self.public_prefix).unwrap_or(location));

        info!(
            input = %path.display(),
            width = result.width,
            height = result.height,
            qa = ?result.qa.status,
            "inspected image"
        );
        Ok(result)
    }

    /// Inspect `paths` on scoped worker threads, at most one per core at a
    /// time. Results keep the order of `paths`.
    fn inspect_all(&self, paths: &[PathBuf]) -> Vec<Result<PipelineResult, InspectError>> {
        let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let mut results = Vec::with_capacity(paths.len());

        for chunk in paths.chunks(workers) {
            std::thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|path| scope.spawn(move || self.inspect(path)))
                    .collect();
                for (handle, path) in handles.into_iter().zip(chunk) {
                    results.push(handle.join().unwrap_or_else(|_| {
                        Err(InspectError::Panicked { path: path.clone() })
                    }));
                }
            });
        }

        results
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn thresholds_from_cli(cli: &Cli) -> ThresholdSet {
    cli.config.as_ref().map_or_else(
        || kensa_io::resolve().clone(),
        |path| ThresholdSource::new(path).load(),
    )
}

fn storage_from_cli(cli: &Cli) -> LocalStorage {
    if cli.no_save {
        LocalStorage::disabled()
    } else if let Some(dir) = &cli.storage_dir {
        LocalStorage::new(dir)
    } else {
        LocalStorage::from_env()
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), serde_json::Error> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

fn batch_report(
    paths: &[PathBuf],
    outcomes: Vec<Result<PipelineResult, InspectError>>,
) -> BatchReport {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for (path, outcome) in paths.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => errors.push(BatchFailure {
                input: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }

    BatchReport {
        job_id: Uuid::new_v4().to_string(),
        status: if errors.is_empty() {
            BatchStatus::Completed
        } else {
            BatchStatus::Partial
        },
        results,
        errors,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let thresholds = thresholds_from_cli(&cli);
    let storage = storage_from_cli(&cli);
    if storage.dir().is_none() {
        info!("no storage directory configured, outputs will not be saved");
    }

    let inspector = Inspector {
        thresholds: &thresholds,
        storage: &storage,
        public_prefix: &cli.public_prefix,
    };

    if let [path] = cli.images.as_slice() {
        return match inspector.inspect(path) {
            Ok(result) => match print_json(&result, cli.compact) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!(error = %e, "failed to serialize result");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                error!(error = %e, "inspection failed");
                ExitCode::FAILURE
            }
        };
    }

    let outcomes = inspector.inspect_all(&cli.images);
    let report = batch_report(&cli.images, outcomes);
    for failure in &report.errors {
        warn!(input = %failure.input, error = %failure.error, "inspection failed");
    }

    if let Err(e) = print_json(&report, cli.compact) {
        error!(error = %e, "failed to serialize batch report");
        return ExitCode::FAILURE;
    }

    if report.status == BatchStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
