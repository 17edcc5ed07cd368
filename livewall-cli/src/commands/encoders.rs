//! Implementation of the `encoders` subcommand.

use std::path::Path;

use console::style;
use serde::Serialize;

use livewall_core::CancellationToken;
use livewall_core::config::{CodecFamily, CodecPreference};
use livewall_core::external::{EncoderCapabilities, detect_encoders};
use livewall_core::processing::encode_plan::select_encoder;

use crate::cli::EncodersArgs;
use crate::commands::{locate_tools, run_control};
use crate::error::CliResult;
use crate::output::write_json;

#[derive(Debug, Serialize)]
struct EncoderEntry {
    name: String,
    codec: CodecFamily,
    hardware: bool,
}

#[derive(Debug, Serialize)]
struct EncoderListing<'a> {
    ffmpeg: &'a Path,
    version: &'a str,
    /// Hardware encoders were test-encoded rather than trusted from the list.
    verified: bool,
    encoders: Vec<EncoderEntry>,
    codec: CodecFamily,
    /// What `--codec-preference auto` would use for `codec`.
    auto: Option<String>,
}

fn listing<'a>(
    ffmpeg: &'a Path,
    version: &'a str,
    verified: bool,
    capabilities: &EncoderCapabilities,
    codec: CodecFamily,
) -> EncoderListing<'a> {
    let encoders = capabilities
        .relevant()
        .into_iter()
        .map(|encoder| EncoderEntry {
            name: encoder.name(),
            codec: encoder.family(),
            hardware: encoder.is_hardware(),
        })
        .collect();
    let auto = select_encoder(CodecPreference::Auto, codec, capabilities)
        .ok()
        .map(|selection| selection.chosen.name());

    EncoderListing {
        ffmpeg,
        version,
        verified,
        encoders,
        codec,
        auto,
    }
}

/// Lists usable encoders. `Ok(false)` when nothing can encode `--codec`.
pub fn run_encoders(args: &EncodersArgs, token: CancellationToken) -> CliResult<bool> {
    let toolchain = locate_tools(&args.tools)?;
    let control = run_control(token, &args.tools);
    let verified = !args.skip_hw_check;
    let capabilities = detect_encoders(&toolchain.ffmpeg, verified, &control)?;

    let report = listing(
        &toolchain.ffmpeg,
        &toolchain.ffmpeg_version,
        verified,
        &capabilities,
        args.codec.into(),
    );

    if args.json {
        write_json(&report)?;
    } else {
        print_listing(&report);
    }

    Ok(report.auto.is_some())
}

fn print_listing(report: &EncoderListing<'_>) {
    println!("{} {}", style("ffmpeg").bold(), report.ffmpeg.display());
    println!("       {}", style(report.version).dim());
    println!();

    if report.encoders.is_empty() {
        println!("{}", style("No usable H.264/HEVC encoders found").red().bold());
    }
    for entry in &report.encoders {
        let kind = if entry.hardware {
            style("hardware").cyan()
        } else {
            style("software").green()
        };
        println!("  {:<14} {:<5} {kind}", entry.name, entry.codec.to_string());
    }
    if !report.verified {
        println!();
        println!("Hardware encoders were listed by ffmpeg but not test-encoded.");
    }

    println!();
    match &report.auto {
        Some(name) => println!("auto ({}) -> {}", report.codec, style(name).bold()),
        None => println!(
            "{}",
            style(format!("auto ({}) -> no usable encoder", report.codec)).red()
        ),
    }
}
