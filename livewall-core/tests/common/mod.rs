// livewall-core/tests/common/mod.rs
//
// Shared helpers for the batch tests.

#![allow(dead_code)]

use livewall_core::config::{CoreConfig, CoreConfigBuilder};
use livewall_core::external::EncoderCapabilities;
use livewall_core::external::mocks::MockProber;
use livewall_core::media::SourceMedia;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress};

/// Creates a small non-empty file standing in for a video.
pub fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    let mut file = File::create(&file_path).expect("Failed to create dummy file");
    file.write_all(b"dummy content")
        .expect("Failed to write dummy content");
    file_path
}

/// Software encoders only, as in a stock ffmpeg build without a GPU.
pub fn software_only() -> EncoderCapabilities {
    EncoderCapabilities::from_names(["libx264", "libx265", "aac"])
}

pub fn config_for(output_dir: &Path) -> CoreConfig {
    CoreConfigBuilder::new()
        .output_dir(output_dir)
        .verify_hardware(false)
        .build()
}

/// Registers an input and the portrait output the encode should produce.
pub fn expect_clip(
    prober: &MockProber,
    input: &Path,
    output: &Path,
    (width, height): (u32, u32),
    duration_secs: f64,
) -> SourceMedia {
    let source = MockProber::media(input, width, height, duration_secs, 30);
    prober.expect(input, source.clone());
    prober.expect(output, MockProber::media(output, 1080, 2400, duration_secs, 30));
    source
}

pub fn progress(frame: u32, time: &str) -> FfmpegEvent {
    FfmpegEvent::Progress(FfmpegProgress {
        frame,
        fps: 30.0,
        q: 23.0,
        size_kb: 512,
        time: time.to_string(),
        bitrate_kbps: 2457.6,
        speed: 1.5,
        raw_log_message: String::new(),
    })
}
