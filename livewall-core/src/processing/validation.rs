//! Post-encode checks on the produced file.
//!
//! The output is probed again and compared with what the plan promised:
//! exact target dimensions and a positive duration close to the expected one.

use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::cancel::RunControl;
use crate::config::{DURATION_TOLERANCE_MIN_SECS, DURATION_TOLERANCE_RATIO};
use crate::error::{CoreError, CoreResult};
use crate::media::{Prober, SourceMedia};
use crate::processing::encode_plan::EncodeSpec;

/// Facts about a validated output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputCheck {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    pub size_bytes: u64,
}

/// Allowed absolute difference between expected and actual duration.
#[must_use]
pub fn duration_tolerance(expected_secs: f64) -> f64 {
    (expected_secs * DURATION_TOLERANCE_RATIO).max(DURATION_TOLERANCE_MIN_SECS)
}

/// Compares probed output facts with the spec.
pub fn check_output(actual: &SourceMedia, spec: &EncodeSpec) -> CoreResult<()> {
    let (width, height) = actual.display_dimensions();
    if (width, height) != (spec.output_width, spec.output_height) {
        return Err(CoreError::Validation(format!(
            "expected {}x{}, found {width}x{height}",
            spec.output_width, spec.output_height
        )));
    }

    if actual.duration_secs <= 0.0 {
        return Err(CoreError::Validation("output has no duration".into()));
    }

    let expected = spec.expected_duration_secs;
    let diff = (actual.duration_secs - expected).abs();
    if diff > duration_tolerance(expected) {
        return Err(CoreError::Validation(format!(
            "expected {expected:.2}s, found {:.2}s (diff {diff:.2}s)",
            actual.duration_secs
        )));
    }

    Ok(())
}

/// Re-probes `spec.output` and runs [`check_output`].
pub fn validate_output<P: Prober + ?Sized>(
    prober: &P,
    spec: &EncodeSpec,
    control: &RunControl,
) -> CoreResult<OutputCheck> {
    let size_bytes = output_size(&spec.output)?;

    let actual = prober.probe(&spec.output, control).map_err(|e| match e {
        CoreError::Cancelled | CoreError::Timeout { .. } => e,
        other => CoreError::Validation(format!("output could not be probed: {other}")),
    })?;
    check_output(&actual, spec)?;

    debug!(
        "Validated {}: {}x{}, {:.2}s",
        spec.output.display(),
        actual.width,
        actual.height,
        actual.duration_secs
    );
    Ok(OutputCheck {
        width: actual.width,
        height: actual.height,
        duration_secs: actual.duration_secs,
        size_bytes,
    })
}

fn output_size(path: &Path) -> CoreResult<u64> {
    let meta = std::fs::metadata(path).map_err(|e| {
        CoreError::Validation(format!("output {} is missing: {e}", path.display()))
    })?;
    if meta.len() == 0 {
        return Err(CoreError::Validation(format!(
            "output {} is empty",
            path.display()
        )));
    }
    Ok(meta.len())
}
