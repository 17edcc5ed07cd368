//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command and
//! returns `Ok(true)` when every item it handled succeeded.

use livewall_core::{CancellationToken, CoreResult, RunControl, Toolchain};

use crate::cli::ToolArgs;

/// The `convert` command: batch conversion into wallpapers.
pub mod convert;

/// The `encoders` command: lists usable video encoders.
pub mod encoders;

/// The `probe` command: prints source properties and the planned geometry.
pub mod probe;

pub use convert::run_convert;
pub use encoders::run_encoders;
pub use probe::run_probe;

/// Finds ffmpeg and ffprobe, honouring explicit paths first.
pub(crate) fn locate_tools(tools: &ToolArgs) -> CoreResult<Toolchain> {
    Toolchain::locate(tools.ffmpeg.as_deref(), tools.ffprobe.as_deref())
}

pub(crate) fn run_control(token: CancellationToken, tools: &ToolArgs) -> RunControl {
    RunControl::new(token, tools.timeout())
}
