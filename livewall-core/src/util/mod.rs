//! Process helpers shared by the probe and encoder-detection code.
//!
//! Short-lived commands (ffprobe, `ffmpeg -encoders`, test encodes) run
//! through `run_command`, which captures output and honours the batch
//! cancellation token and per-process timeout.

pub mod command;

pub use command::{CommandOutput, describe_command, run_command, run_command_checked};
