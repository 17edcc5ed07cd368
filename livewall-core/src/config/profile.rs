//! Target profile: what every output of a batch should look like.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::{DEFAULT_CRF, DEFAULT_FPS_CAP, MAX_CRF};
use crate::error::{CoreError, CoreResult};
use crate::media::FrameRate;

/// Output frame size. Both sides are even and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TargetResolution {
    pub width: u32,
    pub height: u32,
}

impl TargetResolution {
    /// 20:9 phone screens.
    pub const PHONE_20_9: Self = Self {
        width: 1080,
        height: 2400,
    };
    /// 11:5 phone screens.
    pub const PHONE_11_5: Self = Self {
        width: 1080,
        height: 2376,
    };

    pub fn new(width: u32, height: u32) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::Config(format!(
                "target resolution {width}x{height} has a zero side"
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(CoreError::Config(format!(
                "target resolution {width}x{height} must have even sides for yuv420p"
            )));
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl Default for TargetResolution {
    fn default() -> Self {
        Self::PHONE_20_9
    }
}

impl fmt::Display for TargetResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for TargetResolution {
    type Err = CoreError;

    /// Accepts the presets ("1080x2400", "1080x2376"), their ratio aliases
    /// ("20:9", "9x20", "11:5", "5x11") and any custom even `WxH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "20:9" | "9x20" | "9:20" => return Ok(Self::PHONE_20_9),
            "11:5" | "5x11" | "5:11" => return Ok(Self::PHONE_11_5),
            _ => {}
        }
        let (w, h) = normalized
            .split_once('x')
            .ok_or_else(|| CoreError::Config(format!("invalid target '{s}', expected WxH")))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::Config(format!("invalid target width in '{s}'")))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::Config(format!("invalid target height in '{s}'")))?;
        Self::new(width, height)
    }
}

/// How the output frame rate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "rate")]
pub enum FrameRatePolicy {
    /// Keep the source rate unless it exceeds `cap`.
    MatchSource { cap: FrameRate },
    /// Always emit exactly this rate.
    Fixed(FrameRate),
}

impl Default for FrameRatePolicy {
    fn default() -> Self {
        FrameRatePolicy::MatchSource {
            cap: DEFAULT_FPS_CAP,
        }
    }
}

/// Hardware vs. software encoder preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecPreference {
    #[default]
    Auto,
    Gpu,
    Cpu,
}

impl fmt::Display for CodecPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodecPreference::Auto => "auto",
            CodecPreference::Gpu => "gpu",
            CodecPreference::Cpu => "cpu",
        })
    }
}

/// Video codec family of the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecFamily {
    #[default]
    H264,
    Hevc,
}

impl CodecFamily {
    /// Software encoder for this family.
    #[must_use]
    pub fn software_encoder(&self) -> &'static str {
        match self {
            CodecFamily::H264 => "libx264",
            CodecFamily::Hevc => "libx265",
        }
    }
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CodecFamily::H264 => "h264",
            CodecFamily::Hevc => "hevc",
        })
    }
}

/// Rate control requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Crf(u8),
    /// Target bitrate in kbit/s.
    Bitrate(u32),
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Crf(DEFAULT_CRF)
    }
}

/// How a source whose aspect differs from the target is fitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the frame, cropping the overflow.
    #[default]
    Crop,
    /// Letterbox/pillarbox with black bars.
    Pad,
    /// Letterbox over a blurred, zoomed copy of the source.
    Blur,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitMode::Crop => "crop",
            FitMode::Pad => "pad",
            FitMode::Blur => "blur",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioPolicy {
    #[default]
    Keep,
    Drop,
}

/// Settings applied to every file of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetProfile {
    pub resolution: TargetResolution,
    pub frame_rate: FrameRatePolicy,
    pub codec_preference: CodecPreference,
    pub codec_family: CodecFamily,
    pub quality: Quality,
    pub fit: FitMode,
    /// Rotate landscape sources 90° clockwise before fitting.
    pub rotate_landscape: bool,
    pub audio: AudioPolicy,
    /// Trim outputs to at most this many seconds.
    pub max_duration_secs: Option<f64>,
}

impl TargetProfile {
    pub fn validate(&self) -> CoreResult<()> {
        TargetResolution::new(self.resolution.width, self.resolution.height)?;
        match self.quality {
            Quality::Crf(crf) if crf > MAX_CRF => {
                return Err(CoreError::Config(format!(
                    "CRF {crf} out of range (0-{MAX_CRF})"
                )));
            }
            Quality::Bitrate(0) => {
                return Err(CoreError::Config("bitrate must be greater than zero".into()));
            }
            _ => {}
        }
        if let Some(limit) = self.max_duration_secs {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(CoreError::Config(format!(
                    "maximum duration must be positive, got {limit}"
                )));
            }
        }
        Ok(())
    }
}
