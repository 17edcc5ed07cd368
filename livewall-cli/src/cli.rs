// livewall-cli/src/cli.rs
//
// Defines the command-line argument structures using clap, and turns them
// into the core's configuration types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use livewall_core::config::{
    AudioPolicy, CodecFamily, CodecPreference, CoreConfig, CoreConfigBuilder, DEFAULT_CRF,
    DEFAULT_FPS_CAP, FitMode, FrameRatePolicy, Quality, TargetProfile, TargetProfileBuilder,
    TargetResolution,
};
use livewall_core::media::FrameRate;
use std::path::PathBuf;
use std::time::Duration;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "livewall: turn videos into looping phone live wallpapers",
    long_about = "Crops, pads or blur-fills videos to tall phone resolutions such as \
                  1080x2400 and re-encodes them as seamlessly looping MP4 files using ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts video files into live wallpapers
    Convert(ConvertArgs),
    /// Prints what ffprobe reports for files and how they would be converted
    Probe(ProbeArgs),
    /// Lists the video encoders ffmpeg can use here
    Encoders(EncodersArgs),
}

/// Locations of the external tools and the per-process time limit.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolArgs {
    /// ffmpeg binary (otherwise ./ffmpeg/bin, next to livewall, then PATH)
    #[arg(long, value_name = "PATH", env = "LIVEWALL_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe binary (same search order as ffmpeg)
    #[arg(long, value_name = "PATH", env = "LIVEWALL_FFPROBE")]
    pub ffprobe: Option<PathBuf>,

    /// Kill any single ffprobe/ffmpeg process running longer than this
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

impl ToolArgs {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PreferenceArg {
    /// Hardware encoder when one works, software otherwise
    Auto,
    /// Hardware encoder or fail
    Gpu,
    /// Software encoder only
    Cpu,
}

impl From<PreferenceArg> for CodecPreference {
    fn from(arg: PreferenceArg) -> Self {
        match arg {
            PreferenceArg::Auto => CodecPreference::Auto,
            PreferenceArg::Gpu => CodecPreference::Gpu,
            PreferenceArg::Cpu => CodecPreference::Cpu,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CodecArg {
    H264,
    Hevc,
}

impl From<CodecArg> for CodecFamily {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::H264 => CodecFamily::H264,
            CodecArg::Hevc => CodecFamily::Hevc,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FitArg {
    /// Fill the frame, cutting the overflow
    Crop,
    /// Fit inside the frame with black bars
    Pad,
    /// Fit inside the frame over a blurred copy
    Blur,
}

impl From<FitArg> for FitMode {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Crop => FitMode::Crop,
            FitArg::Pad => FitMode::Pad,
            FitArg::Blur => FitMode::Blur,
        }
    }
}

/// Target frame options shared by `convert` and `probe`.
#[derive(Args, Debug, Clone)]
pub struct FrameArgs {
    /// Output resolution: 1080x2400 (20:9), 1080x2376 (11:5) or any even WxH
    #[arg(long, value_name = "WxH", default_value = "1080x2400")]
    pub target: TargetResolution,

    /// How the source is fitted into the target frame
    #[arg(long, value_enum, default_value_t = FitArg::Crop)]
    pub fit: FitArg,

    /// Rotate landscape sources 90° clockwise first
    #[arg(long)]
    pub rotate_landscape: bool,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Video files and/or directories of videos
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Directory where wallpapers are written (created if missing)
    #[arg(short = 'o', long = "output", value_name = "DIR", env = "LIVEWALL_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Also search sub-directories of directory inputs
    #[arg(short, long)]
    pub recursive: bool,

    #[command(flatten)]
    pub frame: FrameArgs,

    /// Which kind of video encoder to use
    #[arg(long, value_enum, default_value_t = PreferenceArg::Auto)]
    pub codec_preference: PreferenceArg,

    /// Output video codec
    #[arg(long, value_enum, default_value_t = CodecArg::H264)]
    pub codec: CodecArg,

    /// Constant quality, 0-51, lower is better
    #[arg(long, value_name = "N", conflicts_with = "bitrate",
          value_parser = clap::value_parser!(u8).range(0..=51))]
    pub crf: Option<u8>,

    /// Target video bitrate instead of constant quality
    #[arg(long, value_name = "KBPS", value_parser = clap::value_parser!(u32).range(1..))]
    pub bitrate: Option<u32>,

    /// Highest output frame rate; faster sources are reduced to it
    #[arg(long, value_name = "N", conflicts_with = "fps",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub fps_cap: Option<u32>,

    /// Fixed output frame rate, e.g. 30 or 30000/1001
    #[arg(long, value_name = "RATE")]
    pub fps: Option<FrameRate>,

    /// Number of files converted at once
    #[arg(short, long, value_name = "K", default_value_t = 1,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: u64,

    /// Drop audio from the outputs
    #[arg(long)]
    pub no_audio: bool,

    /// Trim outputs to at most this many seconds
    #[arg(long, value_name = "SECS", value_parser = parse_positive_secs)]
    pub max_duration: Option<f64>,

    /// Plan every file and print the ffmpeg commands without encoding
    #[arg(long)]
    pub dry_run: bool,

    /// Print the batch report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Trust `ffmpeg -encoders` without a test encode per hardware encoder
    #[arg(long)]
    pub skip_hw_check: bool,

    /// Do not re-probe outputs after encoding
    #[arg(long)]
    pub skip_validation: bool,

    #[command(flatten)]
    pub tools: ToolArgs,
}

fn parse_positive_secs(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err(format!("'{s}' must be greater than zero"))
    }
}

impl ConvertArgs {
    /// Settings applied to every file of the batch.
    #[must_use]
    pub fn profile(&self) -> TargetProfile {
        let quality = match (self.crf, self.bitrate) {
            (_, Some(kbps)) => Quality::Bitrate(kbps),
            (Some(crf), None) => Quality::Crf(crf),
            (None, None) => Quality::Crf(DEFAULT_CRF),
        };
        let frame_rate = match (self.fps, self.fps_cap) {
            (Some(rate), _) => FrameRatePolicy::Fixed(rate),
            (None, Some(cap)) => FrameRatePolicy::MatchSource {
                cap: FrameRate::integer(cap),
            },
            (None, None) => FrameRatePolicy::MatchSource {
                cap: DEFAULT_FPS_CAP,
            },
        };
        let audio = if self.no_audio {
            AudioPolicy::Drop
        } else {
            AudioPolicy::Keep
        };

        TargetProfileBuilder::new()
            .resolution(self.frame.target)
            .frame_rate(frame_rate)
            .codec_preference(self.codec_preference.into())
            .codec_family(self.codec.into())
            .quality(quality)
            .fit(self.frame.fit.into())
            .rotate_landscape(self.frame.rotate_landscape)
            .audio(audio)
            .max_duration_secs(self.max_duration)
            .build()
    }

    /// Run-level configuration.
    #[must_use]
    pub fn config(&self) -> CoreConfig {
        let builder = CoreConfigBuilder::new()
            .output_dir(&self.output_dir)
            .ffmpeg_path(self.tools.ffmpeg.clone())
            .ffprobe_path(self.tools.ffprobe.clone())
            .parallelism(usize::try_from(self.jobs).unwrap_or(usize::MAX))
            .verify_hardware(!self.skip_hw_check)
            .validate_output(!self.skip_validation)
            .dry_run(self.dry_run);
        match self.tools.timeout() {
            Some(timeout) => builder.timeout(timeout).build(),
            None => builder.build(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Video files to inspect
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub frame: FrameArgs,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub tools: ToolArgs,
}

#[derive(Args, Debug)]
pub struct EncodersArgs {
    /// Codec family used to show what `auto` would pick
    #[arg(long, value_enum, default_value_t = CodecArg::H264)]
    pub codec: CodecArg,

    /// List compiled encoders without test-encoding the hardware ones
    #[arg(long)]
    pub skip_hw_check: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub tools: ToolArgs,
}
