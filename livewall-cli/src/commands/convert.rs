//! Implementation of the `convert` subcommand.
//!
//! Resolves inputs and tools, detects encoders once for the whole batch and
//! hands everything to `livewall_core::run_batch`.

use std::sync::Arc;

use indicatif::MultiProgress;
use log::{info, warn};

use livewall_core::external::{SidecarSpawner, detect_encoders};
use livewall_core::media::FfprobeProber;
use livewall_core::{
    CancellationToken, EventDispatcher, Toolkit, collect_inputs, format_duration, run_batch,
};

use crate::cli::ConvertArgs;
use crate::commands::{locate_tools, run_control};
use crate::error::CliResult;
use crate::output::{ProgressHandler, print_json, print_summary};

/// Runs a conversion batch. `Ok(false)` when any file failed or was skipped.
pub fn run_convert(
    args: &ConvertArgs,
    token: CancellationToken,
    multi: &MultiProgress,
) -> CliResult<bool> {
    let profile = args.profile();
    let config = args.config();
    config.validate()?;
    profile.validate()?;

    let inputs = collect_inputs(&args.inputs, args.recursive)?;
    info!("Found {} video file(s) to convert", inputs.len());
    info!(
        "Target {} ({}), {} via {} encoder",
        profile.resolution, profile.fit, profile.codec_family, profile.codec_preference
    );

    let toolchain = locate_tools(&args.tools)?;
    let control = run_control(token, &args.tools);
    let capabilities = detect_encoders(&toolchain.ffmpeg, config.verify_hardware, &control)?;

    let spawner = SidecarSpawner::new(&toolchain.ffmpeg);
    let prober = FfprobeProber::new(&toolchain.ffprobe);
    let toolkit = Toolkit {
        spawner: &spawner,
        prober: &prober,
        capabilities: &capabilities,
    };

    let mut dispatcher = EventDispatcher::new();
    if !args.json {
        dispatcher.add_handler(Arc::new(ProgressHandler::new(multi.clone())));
    }

    let report = run_batch(
        &inputs,
        &profile,
        &config,
        &toolkit,
        &control,
        Some(&dispatcher),
    )?;

    if control.cancel.is_cancelled() {
        warn!(
            "Interrupted after {}; remaining files were skipped",
            format_duration(report.elapsed.as_secs_f64())
        );
    }

    if args.json {
        print_json(&report, config.dry_run)?;
    } else {
        print_summary(&report, config.dry_run);
    }

    Ok(report.all_succeeded(config.dry_run))
}
