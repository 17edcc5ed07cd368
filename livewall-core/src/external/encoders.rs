// ============================================================================
// livewall-core/src/external/encoders.rs
// ============================================================================
//
// ENCODER CAPABILITIES: Which video encoders this ffmpeg build can use
//
// `ffmpeg -encoders` only lists what was compiled in. A hardware encoder can
// be listed and still fail at runtime (no GPU, missing driver), so listed
// hardware candidates are optionally confirmed with a one-frame test encode.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde::Serialize;

use crate::cancel::RunControl;
use crate::config::CodecFamily;
use crate::error::{CoreError, CoreResult};
use crate::util::command::{run_command, run_command_checked};

/// Upper bound for a single hardware test encode.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Hardware encoder families, in the order `auto` tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareBackend {
    Nvenc,
    Qsv,
    Amf,
    VideoToolbox,
}

pub const HARDWARE_PRIORITY: [HardwareBackend; 4] = [
    HardwareBackend::Nvenc,
    HardwareBackend::Qsv,
    HardwareBackend::Amf,
    HardwareBackend::VideoToolbox,
];

impl HardwareBackend {
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            HardwareBackend::Nvenc => "nvenc",
            HardwareBackend::Qsv => "qsv",
            HardwareBackend::Amf => "amf",
            HardwareBackend::VideoToolbox => "videotoolbox",
        }
    }
}

/// A concrete ffmpeg video encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VideoEncoder {
    Hardware {
        backend: HardwareBackend,
        family: CodecFamily,
    },
    Software {
        family: CodecFamily,
    },
}

impl VideoEncoder {
    /// ffmpeg encoder name, e.g. `h264_nvenc` or `libx265`.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            VideoEncoder::Hardware { backend, family } => {
                format!("{family}_{}", backend.suffix())
            }
            VideoEncoder::Software { family } => family.software_encoder().to_string(),
        }
    }

    #[must_use]
    pub fn is_hardware(&self) -> bool {
        matches!(self, VideoEncoder::Hardware { .. })
    }

    #[must_use]
    pub fn family(&self) -> CodecFamily {
        match self {
            VideoEncoder::Hardware { family, .. } | VideoEncoder::Software { family } => *family,
        }
    }
}

impl fmt::Display for VideoEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Set of encoder names known to work with the located ffmpeg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncoderCapabilities {
    available: BTreeSet<String>,
}

impl EncoderCapabilities {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.available.contains(name)
    }

    /// First usable hardware encoder for `family`, in priority order.
    #[must_use]
    pub fn hardware_for(&self, family: CodecFamily) -> Option<VideoEncoder> {
        HARDWARE_PRIORITY
            .iter()
            .map(|&backend| VideoEncoder::Hardware { backend, family })
            .find(|encoder| self.has(&encoder.name()))
    }

    #[must_use]
    pub fn software_for(&self, family: CodecFamily) -> Option<VideoEncoder> {
        let encoder = VideoEncoder::Software { family };
        self.has(&encoder.name()).then_some(encoder)
    }

    /// All usable encoders relevant to wallpaper output, hardware first.
    #[must_use]
    pub fn relevant(&self) -> Vec<VideoEncoder> {
        let mut out = Vec::new();
        for family in [CodecFamily::H264, CodecFamily::Hevc] {
            for backend in HARDWARE_PRIORITY {
                let encoder = VideoEncoder::Hardware { backend, family };
                if self.has(&encoder.name()) {
                    out.push(encoder);
                }
            }
            if let Some(sw) = self.software_for(family) {
                out.push(sw);
            }
        }
        out
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.available.iter().map(String::as_str)
    }
}

/// Every encoder name this tool might pick.
fn candidate_names() -> Vec<String> {
    let mut names = Vec::new();
    for family in [CodecFamily::H264, CodecFamily::Hevc] {
        names.push(family.software_encoder().to_string());
        for backend in HARDWARE_PRIORITY {
            names.push(VideoEncoder::Hardware { backend, family }.name());
        }
    }
    names
}

/// Extracts video encoder names from `ffmpeg -encoders` output.
///
/// Lines after the `------` separator look like
/// ` V....D libx264              libx264 H.264 / AVC ...`.
#[must_use]
pub fn parse_encoder_list(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// Lists encoders and, when `verify_hardware` is set, test-encodes one frame
/// with each listed hardware candidate.
pub fn detect_encoders(
    ffmpeg: &Path,
    verify_hardware: bool,
    control: &RunControl,
) -> CoreResult<EncoderCapabilities> {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-hide_banner", "-encoders"]);
    let output = run_command_checked(&mut cmd, "ffmpeg -encoders", control)?;
    let listed = parse_encoder_list(&output.stdout);
    log::debug!("ffmpeg lists {} video encoders", listed.len());

    let mut usable = Vec::new();
    for name in candidate_names() {
        if !listed.contains(&name) {
            continue;
        }
        let is_software = name.starts_with("lib");
        if is_software || !verify_hardware {
            usable.push(name);
            continue;
        }
        if verify_encoder(ffmpeg, &name, control)? {
            log::debug!("Hardware encoder {name} passed the test encode");
            usable.push(name);
        } else {
            log::info!("Hardware encoder {name} is listed but not usable on this machine");
        }
    }

    Ok(EncoderCapabilities::from_names(usable))
}

/// Runs a one-frame test encode. `Ok(false)` when the encoder fails;
/// cancellation is propagated.
pub fn verify_encoder(ffmpeg: &Path, name: &str, control: &RunControl) -> CoreResult<bool> {
    let mut cmd = Command::new(ffmpeg);
    cmd.args([
        "-hide_banner",
        "-v",
        "error",
        "-f",
        "lavfi",
        "-i",
        "color=c=black:s=256x256:d=0.1",
        "-frames:v",
        "1",
        "-c:v",
        name,
        "-f",
        "null",
        "-",
    ]);

    let bounded = RunControl::new(
        control.cancel.clone(),
        Some(control.timeout.map_or(VERIFY_TIMEOUT, |t| t.min(VERIFY_TIMEOUT))),
    );
    match run_command(&mut cmd, name, &bounded) {
        Ok(output) => Ok(output.status.success()),
        Err(CoreError::Cancelled) => Err(CoreError::Cancelled),
        Err(e) => {
            log::debug!("Test encode with {name} failed: {e}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS_OUTPUT: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V....D hevc_qsv             HEVC (Intel Quick Sync Video acceleration) (codec hevc)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn test_parse_encoder_list() {
        let names = parse_encoder_list(ENCODERS_OUTPUT);
        assert!(names.contains("libx264"));
        assert!(names.contains("h264_nvenc"));
        assert!(names.contains("hevc_qsv"));
        assert!(!names.contains("aac"));
        // Legend lines above the separator are ignored.
        assert!(!names.contains("="));
    }

    #[test]
    fn test_encoder_names() {
        let nvenc = VideoEncoder::Hardware {
            backend: HardwareBackend::Nvenc,
            family: CodecFamily::H264,
        };
        assert_eq!(nvenc.name(), "h264_nvenc");
        let vt = VideoEncoder::Hardware {
            backend: HardwareBackend::VideoToolbox,
            family: CodecFamily::Hevc,
        };
        assert_eq!(vt.name(), "hevc_videotoolbox");
        assert_eq!(
            VideoEncoder::Software {
                family: CodecFamily::Hevc
            }
            .name(),
            "libx265"
        );
    }

    #[test]
    fn test_hardware_priority() {
        let caps = EncoderCapabilities::from_names(["h264_videotoolbox", "h264_qsv", "libx264"]);
        assert_eq!(
            caps.hardware_for(CodecFamily::H264),
            Some(VideoEncoder::Hardware {
                backend: HardwareBackend::Qsv,
                family: CodecFamily::H264
            })
        );
        assert_eq!(caps.hardware_for(CodecFamily::Hevc), None);
        assert!(caps.software_for(CodecFamily::H264).is_some());
        assert!(caps.software_for(CodecFamily::Hevc).is_none());
    }

    #[test]
    fn test_relevant_lists_hardware_first() {
        let caps = EncoderCapabilities::from_names(["libx264", "h264_amf", "libx265"]);
        let names: Vec<String> = caps.relevant().iter().map(VideoEncoder::name).collect();
        assert_eq!(names, vec!["h264_amf", "libx264", "libx265"]);
    }
}
