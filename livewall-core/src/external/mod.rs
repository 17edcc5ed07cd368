// ============================================================================
// livewall-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with the ffmpeg and ffprobe binaries
//
// This module encapsulates everything that starts an external process:
// locating the binaries, detecting encoders, and running encodes. Traits at
// the process boundary (FfmpegSpawner, Prober) let the pipeline run against
// mocks in tests.
//
// KEY COMPONENTS:
// - Toolchain: where ffmpeg/ffprobe live
// - EncoderCapabilities: which video encoders actually work
// - FfmpegSpawner / execute: bounded encode execution
// - mocks: test doubles for the above

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Video encoder listing and hardware verification
pub mod encoders;

/// Traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Binary discovery
pub mod toolchain;

/// Test doubles for ffmpeg and ffprobe
#[cfg(all(unix, any(test, feature = "test-mocks")))]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use encoders::{EncoderCapabilities, HardwareBackend, VideoEncoder, detect_encoders};
pub use ffmpeg_executor::{
    ExecutionOutcome, FfmpegProcess, FfmpegSpawner, ProgressUpdate, SidecarProcess,
    SidecarSpawner, execute,
};
pub use toolchain::Toolchain;

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that a binary runs and answers `-version`.
///
/// # Returns
///
/// * `Ok(String)` - The first line of the version output
/// * `Err(CoreError::DependencyNotFound)` - If the binary does not exist
/// * `Err(CoreError::CommandStart)` - If it exists but fails to start
/// * `Err(CoreError::CommandFailed)` - If it exits with an error
pub(crate) fn check_dependency(binary: &Path) -> CoreResult<String> {
    let name = binary.display().to_string();
    let output = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            log::debug!("Found dependency: {name}");
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
        }
        Ok(output) => Err(crate::error::command_failed_error(
            name,
            output.status,
            "-version check failed",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{name}' not found.");
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{name}': {e}");
            Err(CoreError::CommandStart(name, e))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependency_missing() {
        let err = check_dependency(Path::new("/no/such/binary-livewall")).unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(_)));
    }

    #[test]
    fn test_check_dependency_nonzero_exit() {
        // `false` ignores its arguments and exits 1.
        let Ok(path) = which::which("false") else {
            return;
        };
        let err = check_dependency(&path).unwrap_err();
        assert!(matches!(err, CoreError::CommandFailed { .. }));
    }
}
