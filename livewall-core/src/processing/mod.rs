//! Conversion pipeline: planning one encode and running a batch of them.
//!
//! The planning stages (`geometry`, `encode_plan`, `naming`) are pure and
//! never touch the filesystem or start processes. `batch` ties them to the
//! external tools and `validation` checks what ffmpeg produced.

/// Batch orchestration and per-file results
pub mod batch;

/// Encoder selection, rate control and ffmpeg argument rendering
pub mod encode_plan;

/// Rotation, crop, pad and blur planning for the target frame
pub mod geometry;

/// Collision-free output file names
pub mod naming;

/// Post-encode output checks
pub mod validation;

pub use batch::{BatchReport, ConversionResult, ConversionStatus, Toolkit, run_batch};
pub use encode_plan::{AudioPlan, EncodeSpec, RateControl, VideoFilter, plan_encode};
pub use geometry::{GeometryPlan, Transform, plan_geometry};
pub use naming::assign_output_paths;
pub use validation::validate_output;
