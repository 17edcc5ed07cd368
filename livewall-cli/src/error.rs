// ============================================================================
// livewall-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias and exit codes
//
// The CLI reuses the core error type. Anything that escapes a command as an
// `Err` is process-level and exits with EXIT_FATAL; per-file failures are
// part of the batch report and exit with EXIT_FAILURES.

// ---- Internal crate imports ----
use livewall_core::CoreResult;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Every file succeeded.
pub const EXIT_OK: i32 = 0;

/// At least one file failed or was skipped.
pub const EXIT_FAILURES: i32 = 1;

/// Bad arguments, missing tools or another run-level error.
pub const EXIT_FATAL: i32 = 2;

/// Maps a command outcome to the process exit code.
#[must_use]
pub fn exit_code(outcome: &CliResult<bool>) -> i32 {
    match outcome {
        Ok(true) => EXIT_OK,
        Ok(false) => EXIT_FAILURES,
        Err(_) => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livewall_core::CoreError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Ok(true)), 0);
        assert_eq!(exit_code(&Ok(false)), 1);
        assert_eq!(exit_code(&Err(CoreError::DependencyNotFound("ffmpeg".into()))), 2);
    }
}
