//! Core library for turning ordinary videos into phone live wallpapers.
//!
//! Every input is rotated (when landscape), cropped, padded or blur-filled to
//! a tall phone frame such as 1080x2400, re-encoded with a closed GOP so it
//! loops cleanly, and written as a faststart MP4. ffmpeg and ffprobe do the
//! media work; this crate plans each encode, runs the processes under a
//! timeout and a shared cancellation token, and reports one result per file.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use livewall_core::config::{CoreConfigBuilder, TargetProfileBuilder};
//! use livewall_core::external::{SidecarSpawner, Toolchain, detect_encoders};
//! use livewall_core::media::FfprobeProber;
//! use livewall_core::{CancellationToken, RunControl, Toolkit, collect_inputs, run_batch};
//! use std::path::PathBuf;
//!
//! let toolchain = Toolchain::locate(None, None).unwrap();
//! let config = CoreConfigBuilder::new().output_dir("/path/to/wallpapers").build();
//! let profile = TargetProfileBuilder::new().build();
//! let control = RunControl::new(CancellationToken::new(), config.timeout);
//!
//! let capabilities = detect_encoders(&toolchain.ffmpeg, true, &control).unwrap();
//! let spawner = SidecarSpawner::new(&toolchain.ffmpeg);
//! let prober = FfprobeProber::new(&toolchain.ffprobe);
//! let toolkit = Toolkit {
//!     spawner: &spawner,
//!     prober: &prober,
//!     capabilities: &capabilities,
//! };
//!
//! let inputs = collect_inputs(&[PathBuf::from("/path/to/videos")], false).unwrap();
//! let report = run_batch(&inputs, &profile, &config, &toolkit, &control, None).unwrap();
//! println!("{} converted, {} failed", report.succeeded, report.failed);
//! ```

pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod external;
pub mod media;
pub mod processing;
pub mod util;
pub mod utils;

// Re-exports for public API
pub use cancel::{CancellationToken, RunControl};
pub use config::{CoreConfig, TargetProfile, TargetResolution};
pub use discovery::{collect_inputs, find_processable_files};
pub use error::{CoreError, CoreResult, FailureKind};
pub use events::{Event, EventDispatcher, EventHandler};
pub use external::{EncoderCapabilities, Toolchain};
pub use media::SourceMedia;
pub use processing::{BatchReport, ConversionResult, ConversionStatus, Toolkit, run_batch};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
