//! Implementation of the `probe` subcommand.
//!
//! Shows what ffprobe reports for each file and how it would be fitted into
//! the target frame, without encoding anything.

use std::path::Path;

use console::style;
use log::warn;
use serde::Serialize;

use livewall_core::config::FitMode;
use livewall_core::media::{FfprobeProber, Prober, SourceMedia};
use livewall_core::processing::{GeometryPlan, Transform, plan_geometry};
use livewall_core::{CancellationToken, CoreError, format_bytes, format_duration};

use crate::cli::ProbeArgs;
use crate::commands::{locate_tools, run_control};
use crate::error::CliResult;
use crate::output::write_json;

#[derive(Debug, Serialize)]
struct ProbeEntry<'a> {
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<SourceMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<GeometryPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Probes every file. `Ok(false)` when any of them could not be probed or
/// planned.
pub fn run_probe(args: &ProbeArgs, token: CancellationToken) -> CliResult<bool> {
    let toolchain = locate_tools(&args.tools)?;
    let control = run_control(token, &args.tools);
    let prober = FfprobeProber::new(&toolchain.ffprobe);
    let fit: FitMode = args.frame.fit.into();

    let mut entries = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let planned = prober.probe(path, &control).and_then(|media| {
            let geometry =
                plan_geometry(&media, args.frame.target, fit, args.frame.rotate_landscape)?;
            Ok((media, geometry))
        });

        let entry = match planned {
            Ok((media, geometry)) => ProbeEntry {
                path,
                filter: Some(filter_text(&geometry)),
                media: Some(media),
                geometry: Some(geometry),
                error: None,
            },
            Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
            Err(e) => {
                warn!("{}: {e}", path.display());
                ProbeEntry {
                    path,
                    media: None,
                    geometry: None,
                    filter: None,
                    error: Some(e.to_string()),
                }
            }
        };
        entries.push(entry);
    }

    if args.json {
        write_json(&entries)?;
    } else {
        for entry in &entries {
            print_entry(entry);
        }
    }

    Ok(entries.iter().all(|entry| entry.error.is_none()))
}

fn filter_text(geometry: &GeometryPlan) -> String {
    if geometry.needs_graph() {
        geometry.blur_graph(&[])
    } else {
        geometry.filter_chain().join(",")
    }
}

/// Human description of the geometric step, e.g. `crop 486x1080 at 717,0`.
fn describe_transform(geometry: &GeometryPlan) -> String {
    let mut text = match geometry.transform {
        Transform::ScaleOnly => "scale only".to_string(),
        Transform::Crop {
            width,
            height,
            x,
            y,
        } => format!("crop {width}x{height} at {x},{y}"),
        Transform::Pad {
            scaled_width,
            scaled_height,
            x,
            y,
        } => format!(
            "{} {scaled_width}x{scaled_height} at {x},{y}",
            geometry.fit
        ),
    };
    if geometry.rotate_clockwise {
        text.push_str(" after rotating 90° clockwise");
    }
    text
}

fn print_entry(entry: &ProbeEntry<'_>) {
    println!("{}", style(entry.path.display()).bold());

    if let Some(error) = &entry.error {
        println!("  {} {error}", style("error").red().bold());
        return;
    }

    if let Some(media) = &entry.media {
        let (dw, dh) = media.display_dimensions();
        println!(
            "  {:<10}{}x{} {} @ {} fps, {}",
            "video",
            media.width,
            media.height,
            media.video_codec.as_deref().unwrap_or("unknown"),
            media.frame_rate,
            format_duration(media.duration_secs)
        );
        if media.rotation != 0 {
            println!("  {:<10}{}° (displayed as {dw}x{dh})", "rotation", media.rotation);
        }
        match &media.audio {
            Some(audio) => match audio.channels {
                Some(ch) => println!("  {:<10}{} ({ch} ch)", "audio", audio.codec_name),
                None => println!("  {:<10}{}", "audio", audio.codec_name),
            },
            None => println!("  {:<10}none", "audio"),
        }
        if let Some(size) = media.size_bytes {
            println!("  {:<10}{}", "size", format_bytes(size));
        }
    }

    if let Some(geometry) = &entry.geometry {
        println!("  {:<10}{}", "plan", describe_transform(geometry));
        println!(
            "  {:<10}{}x{}",
            "output", geometry.output_width, geometry.output_height
        );
    }
    if let Some(filter) = &entry.filter {
        println!("  {:<10}{}", "filter", style(filter).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livewall_core::config::TargetResolution;
    use livewall_core::processing::geometry::plan_for_dimensions;

    #[test]
    fn test_describe_crop_and_rotation() {
        let target = TargetResolution::new(1080, 2400).unwrap();
        let plan = plan_for_dimensions(1920, 1080, target, FitMode::Crop, false).unwrap();
        assert_eq!(describe_transform(&plan), "crop 486x1080 at 717,0");

        let rotated = plan_for_dimensions(1920, 1080, target, FitMode::Crop, true).unwrap();
        assert!(describe_transform(&rotated).ends_with("after rotating 90° clockwise"));
    }

    #[test]
    fn test_filter_text_uses_graph_for_blur() {
        let target = TargetResolution::new(1080, 2400).unwrap();
        let plan = plan_for_dimensions(1920, 1080, target, FitMode::Blur, false).unwrap();
        assert!(filter_text(&plan).starts_with("[0:v]"));

        let crop = plan_for_dimensions(1920, 1080, target, FitMode::Crop, false).unwrap();
        assert_eq!(
            filter_text(&crop),
            "crop=486:1080:717:0,scale=1080:2400:flags=lanczos,setsar=1"
        );
    }
}
