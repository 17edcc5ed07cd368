// ============================================================================
// livewall-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDERS: Fluent construction of CoreConfig and TargetProfile
//
// Both builders start from the defaults in `config` and never panic; call
// `validate()` on the built value to check ranges.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::{
    AudioPolicy, CodecFamily, CodecPreference, CoreConfig, FitMode, FrameRatePolicy, Quality,
    TargetProfile, TargetResolution,
};

/// Builder for creating CoreConfig instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a builder holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory where outputs are written.
    #[must_use]
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.ffmpeg_path = path;
        self
    }

    #[must_use]
    pub fn ffprobe_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.ffprobe_path = path;
        self
    }

    /// Sets how many files are converted at once.
    #[must_use]
    pub fn parallelism(mut self, jobs: usize) -> Self {
        self.config.parallelism = jobs;
        self
    }

    /// Bounds every probe and encode process.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn verify_hardware(mut self, verify: bool) -> Self {
        self.config.verify_hardware = verify;
        self
    }

    #[must_use]
    pub fn validate_output(mut self, validate: bool) -> Self {
        self.config.validate_output = validate;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

/// Builder for creating TargetProfile instances.
///
/// # Examples
///
/// ```rust
/// use livewall_core::config::{FitMode, Quality, TargetProfileBuilder, TargetResolution};
///
/// let profile = TargetProfileBuilder::new()
///     .resolution(TargetResolution::PHONE_11_5)
///     .quality(Quality::Crf(20))
///     .fit(FitMode::Blur)
///     .build();
/// assert_eq!(profile.resolution.height, 2376);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TargetProfileBuilder {
    profile: TargetProfile,
}

impl TargetProfileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn resolution(mut self, resolution: TargetResolution) -> Self {
        self.profile.resolution = resolution;
        self
    }

    #[must_use]
    pub fn frame_rate(mut self, policy: FrameRatePolicy) -> Self {
        self.profile.frame_rate = policy;
        self
    }

    #[must_use]
    pub fn codec_preference(mut self, preference: CodecPreference) -> Self {
        self.profile.codec_preference = preference;
        self
    }

    #[must_use]
    pub fn codec_family(mut self, family: CodecFamily) -> Self {
        self.profile.codec_family = family;
        self
    }

    #[must_use]
    pub fn quality(mut self, quality: Quality) -> Self {
        self.profile.quality = quality;
        self
    }

    #[must_use]
    pub fn fit(mut self, fit: FitMode) -> Self {
        self.profile.fit = fit;
        self
    }

    #[must_use]
    pub fn rotate_landscape(mut self, rotate: bool) -> Self {
        self.profile.rotate_landscape = rotate;
        self
    }

    #[must_use]
    pub fn audio(mut self, audio: AudioPolicy) -> Self {
        self.profile.audio = audio;
        self
    }

    /// Trims every output to at most `secs` seconds.
    #[must_use]
    pub fn max_duration_secs(mut self, secs: Option<f64>) -> Self {
        self.profile.max_duration_secs = secs;
        self
    }

    #[must_use]
    pub fn build(self) -> TargetProfile {
        self.profile
    }
}
