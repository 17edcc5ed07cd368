//! Source media description and probing.

pub mod frame_rate;
pub mod probe;

pub use frame_rate::FrameRate;
pub use probe::{FfprobeProber, Prober, parse_probe_json};

use serde::Serialize;
use std::path::PathBuf;

/// First audio stream of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioStream {
    pub codec_name: String,
    pub channels: Option<u32>,
}

/// What ffprobe told us about one input. Produced once per file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMedia {
    pub path: PathBuf,
    /// Coded width, before any display rotation.
    pub width: u32,
    /// Coded height, before any display rotation.
    pub height: u32,
    pub duration_secs: f64,
    pub frame_rate: FrameRate,
    /// Display rotation in degrees, normalised to 0..360.
    pub rotation: u32,
    pub frame_count: Option<u64>,
    pub video_codec: Option<String>,
    pub audio: Option<AudioStream>,
    pub size_bytes: Option<u64>,
}

impl SourceMedia {
    /// Dimensions as displayed. ffmpeg applies the rotation on decode, so
    /// filters see these, not the coded size.
    #[must_use]
    pub fn display_dimensions(&self) -> (u32, u32) {
        if self.rotation % 180 == 90 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}
