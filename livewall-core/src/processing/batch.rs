// ============================================================================
// livewall-core/src/processing/batch.rs
// ============================================================================
//
// BATCH ORCHESTRATION: One ConversionResult per input, in input order
//
// WORKFLOW per file:
//   probe -> plan geometry -> plan encode -> execute -> validate
//
// A failure at any stage is recorded on that file's result and the batch
// moves on. Only process-level problems (invalid configuration, an output
// directory that cannot be created, no usable software encoder) abort the
// run, and they do so before the first file is touched.

// ---- Internal crate imports ----
use crate::cancel::RunControl;
use crate::config::{CodecPreference, CoreConfig, TargetProfile};
use crate::error::{CoreError, CoreResult, FailureKind};
use crate::events::{Event, EventDispatcher};
use crate::external::encoders::EncoderCapabilities;
use crate::external::ffmpeg_executor::{FfmpegSpawner, cleanup_partial_output, execute};
use crate::media::Prober;
use crate::processing::encode_plan::plan_encode;
use crate::processing::geometry::plan_geometry;
use crate::processing::naming::assign_output_paths;
use crate::processing::validation::validate_output;

// ---- External crate imports ----
use log::{error, info, warn};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

// ---- Standard library imports ----
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ============================================================================
// RESULT TYPES
// ============================================================================

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Outcome of one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ConversionStatus {
    Succeeded,
    Failed { kind: FailureKind, reason: String },
    /// Never started (cancelled batch) or only planned (dry run).
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: ConversionStatus,
    pub output: Option<PathBuf>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// ffmpeg name of the video encoder, once one was chosen.
    pub encoder: Option<String>,
    /// `auto` preference fell back to software.
    pub fell_back: bool,
    pub output_size: Option<u64>,
    /// Full ffmpeg arguments, recorded for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_args: Option<Vec<String>>,
}

impl ConversionResult {
    fn new(input: &Path, status: ConversionStatus) -> Self {
        Self {
            input: input.to_path_buf(),
            status,
            output: None,
            elapsed: Duration::ZERO,
            encoder: None,
            fell_back: false,
            output_size: None,
            planned_args: None,
        }
    }

    fn skipped(input: &Path, reason: &str) -> Self {
        Self::new(
            input,
            ConversionStatus::Skipped {
                reason: reason.to_string(),
            },
        )
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Succeeded
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.status {
            ConversionStatus::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Ordered results of a batch with summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    #[must_use]
    pub fn new(results: Vec<ConversionResult>, elapsed: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results
            .iter()
            .filter(|r| matches!(r.status, ConversionStatus::Failed { .. }))
            .count();
        let skipped = results.len() - succeeded - failed;
        Self {
            results,
            elapsed,
            succeeded,
            failed,
            skipped,
        }
    }

    /// Every file succeeded (a dry run counts as success).
    #[must_use]
    pub fn all_succeeded(&self, dry_run: bool) -> bool {
        self.failed == 0 && (dry_run || self.skipped == 0)
    }
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// External collaborators of a batch.
pub struct Toolkit<'a, S: FfmpegSpawner, P: Prober> {
    pub spawner: &'a S,
    pub prober: &'a P,
    pub capabilities: &'a EncoderCapabilities,
}

/// Converts `paths` according to `profile`.
///
/// # Errors
///
/// Only process-level failures; per-file failures are in the report.
pub fn run_batch<S: FfmpegSpawner, P: Prober>(
    paths: &[PathBuf],
    profile: &TargetProfile,
    config: &CoreConfig,
    toolkit: &Toolkit<'_, S, P>,
    control: &RunControl,
    events: Option<&EventDispatcher>,
) -> CoreResult<BatchReport> {
    config.validate()?;
    profile.validate()?;
    check_software_encoder(profile, toolkit.capabilities)?;

    if !config.dry_run {
        std::fs::create_dir_all(&config.output_dir).map_err(|e| {
            CoreError::Config(format!(
                "cannot create output directory {}: {e}",
                config.output_dir.display()
            ))
        })?;
    }

    let outputs = assign_output_paths(paths, &config.output_dir, profile.resolution)?;
    let jobs: Vec<(usize, &PathBuf, PathBuf)> = paths
        .iter()
        .zip(outputs)
        .enumerate()
        .map(|(index, (input, output))| (index, input, output))
        .collect();

    let total = jobs.len();
    let parallelism = config.parallelism.max(1);
    info!(
        "Converting {total} file(s) to {} ({} job(s) at once)",
        profile.resolution, parallelism
    );
    emit(
        events,
        Event::BatchStarted {
            total_files: total,
            parallelism,
            output_dir: config.output_dir.clone(),
        },
    );

    let start = Instant::now();
    let run_one = |(index, input, output): &(usize, &PathBuf, PathBuf)| {
        let result = convert_one(*index, total, input, output, profile, config, toolkit, control, events);
        emit(
            events,
            Event::FileFinished {
                index: *index,
                result: result.clone(),
            },
        );
        result
    };

    let results: Vec<ConversionResult> = if parallelism == 1 || total <= 1 {
        jobs.iter().map(run_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .build()
            .map_err(|e| CoreError::Config(format!("cannot start worker pool: {e}")))?;
        pool.install(|| jobs.par_iter().map(run_one).collect())
    };

    let report = BatchReport::new(results, start.elapsed());
    info!(
        "Batch finished: {} succeeded, {} failed, {} skipped",
        report.succeeded, report.failed, report.skipped
    );
    emit(
        events,
        Event::BatchFinished {
            succeeded: report.succeeded,
            failed: report.failed,
            skipped: report.skipped,
            elapsed: report.elapsed,
        },
    );
    Ok(report)
}

fn emit(events: Option<&EventDispatcher>, event: Event) {
    if let Some(dispatcher) = events {
        dispatcher.emit(event);
    }
}

/// Without a software encoder neither `cpu` nor the `auto` fallback can work.
fn check_software_encoder(
    profile: &TargetProfile,
    capabilities: &EncoderCapabilities,
) -> CoreResult<()> {
    if profile.codec_preference == CodecPreference::Gpu {
        return Ok(());
    }
    if capabilities.software_for(profile.codec_family).is_some() {
        return Ok(());
    }
    if profile.codec_preference == CodecPreference::Auto
        && capabilities.hardware_for(profile.codec_family).is_some()
    {
        warn!(
            "Software encoder {} is unavailable; relying on hardware only",
            profile.codec_family.software_encoder()
        );
        return Ok(());
    }
    Err(CoreError::DependencyNotFound(format!(
        "{} encoder in ffmpeg",
        profile.codec_family.software_encoder()
    )))
}

#[allow(clippy::too_many_arguments)]
fn convert_one<S: FfmpegSpawner, P: Prober>(
    index: usize,
    total: usize,
    input: &Path,
    output: &Path,
    profile: &TargetProfile,
    config: &CoreConfig,
    toolkit: &Toolkit<'_, S, P>,
    control: &RunControl,
    events: Option<&EventDispatcher>,
) -> ConversionResult {
    if control.cancel.is_cancelled() {
        return ConversionResult::skipped(input, "batch cancelled before this file started");
    }

    emit(
        events,
        Event::FileStarted {
            index,
            total_files: total,
            input: input.to_path_buf(),
        },
    );
    info!("[{}/{}] {}", index + 1, total, input.display());

    let start = Instant::now();
    let mut result = ConversionResult::new(input, ConversionStatus::Succeeded);
    if let Err(e) = run_pipeline(index, input, output, profile, config, toolkit, control, events, &mut result) {
        let kind = e.failure_kind();
        error!("{}: {kind}: {e}", input.display());
        result.status = ConversionStatus::Failed {
            kind,
            reason: e.to_string(),
        };
        result.output = None;
        result.output_size = None;
    }
    result.elapsed = start.elapsed();
    result
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline<S: FfmpegSpawner, P: Prober>(
    index: usize,
    input: &Path,
    output: &Path,
    profile: &TargetProfile,
    config: &CoreConfig,
    toolkit: &Toolkit<'_, S, P>,
    control: &RunControl,
    events: Option<&EventDispatcher>,
    result: &mut ConversionResult,
) -> CoreResult<()> {
    let source = toolkit.prober.probe(input, control)?;
    let geometry = plan_geometry(&source, profile.resolution, profile.fit, profile.rotate_landscape)?;
    let spec = plan_encode(&geometry, &source, profile, toolkit.capabilities, output)?;

    result.encoder = Some(spec.encoder.name());
    result.fell_back = spec.selection.fell_back;
    if spec.selection.fell_back {
        info!(
            "No hardware {} encoder available, using {}",
            profile.codec_family, spec.encoder
        );
    }

    if config.dry_run {
        result.planned_args = Some(spec.to_args());
        result.output = Some(spec.output.clone());
        result.status = ConversionStatus::Skipped {
            reason: "dry run".to_string(),
        };
        return Ok(());
    }

    let total_frames = spec.expected_frames();
    emit(
        events,
        Event::EncoderSelected {
            index,
            encoder: spec.encoder,
            fell_back: spec.selection.fell_back,
            total_frames,
        },
    );

    let mut on_progress = |update: &crate::external::ProgressUpdate| {
        emit(
            events,
            Event::EncodingProgress {
                index,
                frame: update.frame,
                total_frames,
                time_secs: update.time_secs,
                fps: update.fps,
                speed: update.speed,
            },
        );
    };
    execute(toolkit.spawner, &spec, control, &mut on_progress)?;

    let size = if config.validate_output {
        match validate_output(toolkit.prober, &spec, control) {
            Ok(check) => check.size_bytes,
            Err(e) => {
                cleanup_partial_output(&spec.output);
                return Err(e);
            }
        }
    } else {
        std::fs::metadata(&spec.output)?.len()
    };

    result.output = Some(spec.output);
    result.output_size = Some(size);
    Ok(())
}
