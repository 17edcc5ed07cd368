//! Encode planning: everything ffmpeg needs to produce one wallpaper.
//!
//! `plan_encode` is pure. It combines the geometry, the source facts, the
//! batch profile and the detected encoders into an [`EncodeSpec`], whose
//! `to_args` renders the complete ffmpeg argument list.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{
    AudioPolicy, CodecFamily, CodecPreference, DEFAULT_AUDIO_BITRATE_KBPS,
    DEFAULT_HW_BITRATE_KBPS, FrameRatePolicy, MAX_CRF, Quality, TargetProfile,
};
use crate::error::{CoreError, CoreResult};
use crate::external::encoders::{EncoderCapabilities, HardwareBackend, VideoEncoder};
use crate::media::{FrameRate, SourceMedia};
use crate::processing::geometry::GeometryPlan;

/// Audio codecs that can be stream-copied into MP4.
const MP4_COPYABLE_AUDIO: &[&str] = &["aac", "mp3", "opus", "ac3"];

/// Keyframe interval in seconds of output.
const GOP_SECONDS: u64 = 2;

/// Video filter description: a linear `-vf` chain or a labelled graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum VideoFilter {
    Chain(Vec<String>),
    /// `-filter_complex` graph whose output pad is `[v]`.
    Graph(String),
}

/// Rate control as requested; rendered per encoder by [`EncodeSpec::to_args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateControl {
    /// CRF on software encoders, the nearest constant-quality mode on hardware.
    ConstantQuality(u8),
    Bitrate {
        kbps: u32,
        max_kbps: u32,
        buffer_kbps: u32,
    },
}

impl RateControl {
    fn from_quality(quality: Quality) -> Self {
        match quality {
            Quality::Crf(crf) => RateControl::ConstantQuality(crf),
            Quality::Bitrate(kbps) => RateControl::Bitrate {
                kbps,
                max_kbps: kbps.saturating_mul(3) / 2,
                buffer_kbps: kbps.saturating_mul(2),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AudioPlan {
    /// Source has no audio, or audio was dropped.
    None,
    Copy,
    Encode { codec: String, bitrate_kbps: u32 },
}

/// Record of how the video encoder was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncoderSelection {
    pub requested: CodecPreference,
    pub chosen: VideoEncoder,
    /// `auto` found no hardware encoder and used software.
    pub fell_back: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filter: VideoFilter,
    pub encoder: VideoEncoder,
    pub selection: EncoderSelection,
    pub rate_control: RateControl,
    pub output_frame_rate: FrameRate,
    pub gop_size: u64,
    pub audio: AudioPlan,
    pub duration_limit_secs: Option<f64>,
    pub output_width: u32,
    pub output_height: u32,
    /// Duration the output should have, for validation and progress.
    pub expected_duration_secs: f64,
}

/// Chooses the encoder for `preference`.
pub fn select_encoder(
    preference: CodecPreference,
    family: CodecFamily,
    capabilities: &EncoderCapabilities,
) -> CoreResult<EncoderSelection> {
    let software = || {
        capabilities.software_for(family).ok_or_else(|| {
            CoreError::EncodeSpec(format!(
                "software encoder {} is not available in this ffmpeg build",
                family.software_encoder()
            ))
        })
    };

    let (chosen, fell_back) = match preference {
        CodecPreference::Gpu => {
            let hw = capabilities.hardware_for(family).ok_or_else(|| {
                CoreError::EncodeSpec(format!("no hardware {family} encoder is available"))
            })?;
            (hw, false)
        }
        CodecPreference::Cpu => (software()?, false),
        CodecPreference::Auto => match capabilities.hardware_for(family) {
            Some(hw) => (hw, false),
            None => (software()?, true),
        },
    };

    Ok(EncoderSelection {
        requested: preference,
        chosen,
        fell_back,
    })
}

/// Output rate and whether an `fps` filter is needed to reach it.
#[must_use]
pub fn resolve_frame_rate(source: FrameRate, policy: FrameRatePolicy) -> (FrameRate, bool) {
    match policy {
        FrameRatePolicy::MatchSource { cap } if source > cap => (cap, true),
        FrameRatePolicy::MatchSource { .. } => (source, false),
        FrameRatePolicy::Fixed(rate) => (rate, source != rate),
    }
}

fn plan_audio(source: &SourceMedia, policy: AudioPolicy) -> AudioPlan {
    if policy == AudioPolicy::Drop {
        return AudioPlan::None;
    }
    match &source.audio {
        None => AudioPlan::None,
        Some(stream) if MP4_COPYABLE_AUDIO.contains(&stream.codec_name.as_str()) => {
            AudioPlan::Copy
        }
        Some(_) => AudioPlan::Encode {
            codec: "aac".to_string(),
            bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
        },
    }
}

/// Builds the encode specification for one file.
pub fn plan_encode(
    geometry: &GeometryPlan,
    source: &SourceMedia,
    profile: &TargetProfile,
    capabilities: &EncoderCapabilities,
    output_path: &Path,
) -> CoreResult<EncodeSpec> {
    if let Quality::Crf(crf) = profile.quality {
        if crf > MAX_CRF {
            return Err(CoreError::EncodeSpec(format!("CRF {crf} is out of range")));
        }
    }
    if profile.quality == Quality::Bitrate(0) {
        return Err(CoreError::EncodeSpec("bitrate must be greater than zero".into()));
    }

    let selection = select_encoder(profile.codec_preference, profile.codec_family, capabilities)?;
    let (output_frame_rate, needs_fps_filter) =
        resolve_frame_rate(source.frame_rate, profile.frame_rate);

    let mut tail = Vec::new();
    if needs_fps_filter {
        tail.push(format!("fps={output_frame_rate}"));
    }

    let filter = if geometry.needs_graph() {
        tail.push("format=yuv420p".to_string());
        VideoFilter::Graph(geometry.blur_graph(&tail))
    } else {
        let mut chain = geometry.filter_chain();
        chain.extend(tail);
        VideoFilter::Chain(chain)
    };

    let gop_size = gop_frames(output_frame_rate);

    let duration_limit_secs = profile
        .max_duration_secs
        .filter(|limit| *limit < source.duration_secs);
    let expected_duration_secs = duration_limit_secs.unwrap_or(source.duration_secs);

    Ok(EncodeSpec {
        input: source.path.clone(),
        output: output_path.to_path_buf(),
        filter,
        encoder: selection.chosen,
        selection,
        rate_control: RateControl::from_quality(profile.quality),
        output_frame_rate,
        gop_size,
        audio: plan_audio(source, profile.audio),
        duration_limit_secs,
        output_width: geometry.output_width,
        output_height: geometry.output_height,
        expected_duration_secs,
    })
}

/// Frames in `GOP_SECONDS` at `rate`, rounded up.
fn gop_frames(rate: FrameRate) -> u64 {
    let num = u64::from(rate.num());
    let den = u64::from(rate.den());
    ((GOP_SECONDS * num).div_ceil(den)).max(1)
}

/// VideoToolbox `-q:v` runs 1-100 with higher meaning better; CRF runs
/// 0-51 with lower meaning better. Linear map, so only approximate.
fn videotoolbox_quality(crf: u8) -> u32 {
    let crf = u32::from(crf.min(MAX_CRF));
    let max = u32::from(MAX_CRF);
    (((max - crf) * 100 + max / 2) / max).clamp(1, 100)
}

impl EncodeSpec {
    /// Average frame count of the output, for progress display.
    #[must_use]
    pub fn expected_frames(&self) -> u64 {
        let millis = (self.expected_duration_secs.max(0.0) * 1000.0).round() as u64;
        let num = u64::from(self.output_frame_rate.num());
        let divisor = u64::from(self.output_frame_rate.den()) * 1000;
        (millis * num + divisor / 2) / divisor
    }

    /// Full ffmpeg argument list (without the binary). Deterministic.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            self.input.to_string_lossy().into_owned(),
        ];

        if let Some(limit) = self.duration_limit_secs {
            args.extend(["-t".into(), format!("{limit:.3}")]);
        }

        match &self.filter {
            VideoFilter::Chain(steps) => {
                args.extend(["-vf".into(), steps.join(",")]);
                args.extend(["-map".into(), "0:v:0".into()]);
            }
            VideoFilter::Graph(graph) => {
                args.extend(["-filter_complex".into(), graph.clone()]);
                args.extend(["-map".into(), "[v]".into()]);
            }
        }
        if self.audio != AudioPlan::None {
            args.extend(["-map".into(), "0:a:0?".into()]);
        }

        args.extend(["-c:v".into(), self.encoder.name()]);
        self.push_encoder_args(&mut args);

        args.extend([
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            self.output_frame_rate.to_string(),
            "-g".into(),
            self.gop_size.to_string(),
            "-flags".into(),
            "+cgop".into(),
        ]);
        if self.encoder == (VideoEncoder::Software { family: CodecFamily::Hevc }) {
            args.extend(["-x265-params".into(), "open-gop=0".into()]);
        }

        match &self.audio {
            AudioPlan::None => args.push("-an".into()),
            AudioPlan::Copy => args.extend(["-c:a".into(), "copy".into()]),
            AudioPlan::Encode {
                codec,
                bitrate_kbps,
            } => args.extend([
                "-c:a".into(),
                codec.clone(),
                "-b:a".into(),
                format!("{bitrate_kbps}k"),
            ]),
        }

        args.extend([
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
            self.output.to_string_lossy().into_owned(),
        ]);
        args
    }

    fn push_encoder_args(&self, args: &mut Vec<String>) {
        let backend = match self.encoder {
            VideoEncoder::Software { .. } => None,
            VideoEncoder::Hardware { backend, .. } => Some(backend),
        };

        // Speed/quality presets.
        match backend {
            None => args.extend(["-preset".into(), "slow".into()]),
            Some(HardwareBackend::Nvenc) => {
                args.extend(["-preset".into(), "p4".into(), "-tune".into(), "hq".into()]);
            }
            Some(_) => {}
        }

        match (self.rate_control, backend) {
            (RateControl::ConstantQuality(crf), None) => {
                args.extend(["-crf".into(), crf.to_string()]);
            }
            (RateControl::ConstantQuality(crf), Some(HardwareBackend::Nvenc)) => {
                args.extend([
                    "-rc".into(),
                    "vbr".into(),
                    "-cq".into(),
                    crf.to_string(),
                    "-b:v".into(),
                    "0".into(),
                    "-maxrate".into(),
                    format!("{}k", DEFAULT_HW_BITRATE_KBPS * 3 / 2),
                    "-bufsize".into(),
                    format!("{}k", DEFAULT_HW_BITRATE_KBPS * 2),
                ]);
            }
            (RateControl::ConstantQuality(crf), Some(HardwareBackend::Qsv)) => {
                args.extend(["-global_quality".into(), crf.to_string()]);
            }
            (RateControl::ConstantQuality(crf), Some(HardwareBackend::Amf)) => {
                args.extend([
                    "-rc".into(),
                    "cqp".into(),
                    "-qp_i".into(),
                    crf.to_string(),
                    "-qp_p".into(),
                    crf.to_string(),
                ]);
            }
            (RateControl::ConstantQuality(crf), Some(HardwareBackend::VideoToolbox)) => {
                args.extend(["-q:v".into(), videotoolbox_quality(crf).to_string()]);
            }
            (
                RateControl::Bitrate {
                    kbps,
                    max_kbps,
                    buffer_kbps,
                },
                backend,
            ) => {
                if backend == Some(HardwareBackend::Nvenc) {
                    args.extend(["-rc".into(), "vbr".into()]);
                }
                args.extend([
                    "-b:v".into(),
                    format!("{kbps}k"),
                    "-maxrate".into(),
                    format!("{max_kbps}k"),
                    "-bufsize".into(),
                    format!("{buffer_kbps}k"),
                ]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_frame_rate_cap() {
        let cap = FrameRate::integer(60);
        let policy = FrameRatePolicy::MatchSource { cap };
        assert_eq!(
            resolve_frame_rate(FrameRate::integer(120), policy),
            (cap, true)
        );
        let ntsc = FrameRate::new(30000, 1001).unwrap();
        assert_eq!(resolve_frame_rate(ntsc, policy), (ntsc, false));
        assert_eq!(resolve_frame_rate(cap, policy), (cap, false));
    }

    #[test]
    fn test_resolve_frame_rate_fixed() {
        let thirty = FrameRate::integer(30);
        let policy = FrameRatePolicy::Fixed(thirty);
        assert_eq!(resolve_frame_rate(thirty, policy), (thirty, false));
        assert_eq!(
            resolve_frame_rate(FrameRate::integer(24), policy),
            (thirty, true)
        );
    }

    #[test]
    fn test_videotoolbox_quality_mapping() {
        assert_eq!(videotoolbox_quality(0), 100);
        assert_eq!(videotoolbox_quality(51), 1);
        assert_eq!(videotoolbox_quality(23), 55);
        assert!(videotoolbox_quality(18) > videotoolbox_quality(28));
    }

    #[test]
    fn test_bitrate_derivation() {
        assert_eq!(
            RateControl::from_quality(Quality::Bitrate(8000)),
            RateControl::Bitrate {
                kbps: 8000,
                max_kbps: 12000,
                buffer_kbps: 16000
            }
        );
    }

    #[test]
    fn test_select_encoder() {
        let sw_only = EncoderCapabilities::from_names(["libx264"]);
        let auto = select_encoder(CodecPreference::Auto, CodecFamily::H264, &sw_only).unwrap();
        assert!(auto.fell_back);
        assert!(!auto.chosen.is_hardware());

        let gpu = select_encoder(CodecPreference::Gpu, CodecFamily::H264, &sw_only);
        assert!(matches!(gpu, Err(CoreError::EncodeSpec(_))));

        let none = EncoderCapabilities::default();
        assert!(select_encoder(CodecPreference::Cpu, CodecFamily::H264, &none).is_err());
        assert!(select_encoder(CodecPreference::Auto, CodecFamily::H264, &none).is_err());
    }
}
