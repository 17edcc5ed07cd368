//! Configuration structures and constants for the livewall-core library.
//!
//! `CoreConfig` holds the run-level settings (where outputs go, which
//! binaries to use, how many files at once). `TargetProfile` describes the
//! outputs themselves and is shared by every file of a batch.

mod builder;
mod profile;

use std::path::PathBuf;
use std::time::Duration;

pub use builder::{CoreConfigBuilder, TargetProfileBuilder};
pub use profile::{
    AudioPolicy, CodecFamily, CodecPreference, FitMode, FrameRatePolicy, Quality, TargetProfile,
    TargetResolution,
};

use crate::error::{CoreError, CoreResult};
use crate::media::FrameRate;

// Default constants

/// Default constant-quality value. Mapped onto each hardware encoder's own
/// quality scale when a GPU path is chosen.
pub const DEFAULT_CRF: u8 = 23;

/// Highest CRF accepted by libx264/libx265.
pub const MAX_CRF: u8 = 51;

/// Sources faster than this are resampled down by default.
pub const DEFAULT_FPS_CAP: FrameRate = FrameRate::integer(60);

/// Average bitrate ceiling (kbit/s) for hardware constant-quality encodes.
/// Peak rate is 1.5x and the VBV buffer 2x this value.
pub const DEFAULT_HW_BITRATE_KBPS: u32 = 10_000;

/// Audio bitrate used when the source audio has to be re-encoded.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

/// Relative tolerance when comparing output and expected durations.
pub const DURATION_TOLERANCE_RATIO: f64 = 0.05;

/// Absolute floor for the duration tolerance, in seconds.
pub const DURATION_TOLERANCE_MIN_SECS: f64 = 0.5;

/// Run-level configuration for a batch.
///
/// # Examples
///
/// ```rust
/// use livewall_core::config::CoreConfigBuilder;
/// use std::time::Duration;
///
/// let config = CoreConfigBuilder::new()
///     .output_dir("/tmp/wallpapers")
///     .parallelism(2)
///     .timeout(Duration::from_secs(600))
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory where outputs are written. Created if missing.
    pub output_dir: PathBuf,

    /// Explicit ffmpeg binary; otherwise located automatically.
    pub ffmpeg_path: Option<PathBuf>,

    /// Explicit ffprobe binary; otherwise located automatically.
    pub ffprobe_path: Option<PathBuf>,

    /// Number of files converted at once. 1 means strictly sequential.
    pub parallelism: usize,

    /// Upper bound for each probe and encode process.
    pub timeout: Option<Duration>,

    /// Run a one-frame test encode before trusting a listed hardware encoder.
    pub verify_hardware: bool,

    /// Re-probe outputs and check their size and duration.
    pub validate_output: bool,

    /// Plan every file but never start an encode.
    pub dry_run: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            ffmpeg_path: None,
            ffprobe_path: None,
            parallelism: 1,
            timeout: None,
            verify_hardware: true,
            validate_output: true,
            dry_run: false,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.parallelism == 0 {
            return Err(CoreError::Config("parallelism must be at least 1".into()));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::Config("timeout must be greater than zero".into()));
        }
        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(CoreError::Config(format!(
                "output path {} exists and is not a directory",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.parallelism, 1);
        assert!(config.timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_jobs = CoreConfig {
            parallelism: 0,
            ..CoreConfig::default()
        };
        assert!(zero_jobs.validate().is_err());

        let zero_timeout = CoreConfig {
            timeout: Some(Duration::ZERO),
            ..CoreConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        let file_as_dir = CoreConfig {
            output_dir: file.path().to_path_buf(),
            ..CoreConfig::default()
        };
        assert!(matches!(file_as_dir.validate(), Err(CoreError::Config(_))));
    }
}
