//! Output file naming.
//!
//! Every input maps to `<output_dir>/<stem>_<W>x<H>.mp4`. Inputs that would
//! produce the same name (same stem from different directories) get `_2`,
//! `_3`, ... in input order, so the assignment is deterministic.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::TargetResolution;
use crate::error::CoreResult;
use crate::utils::file_stem_safe;

/// Output name for a stem; an `index` above 1 appends `_<index>`.
#[must_use]
pub fn output_file_name(stem: &str, resolution: TargetResolution, index: usize) -> String {
    if index <= 1 {
        format!("{stem}_{resolution}.mp4")
    } else {
        format!("{stem}_{resolution}_{index}.mp4")
    }
}

/// Assigns one output path per input, in input order.
///
/// Names are compared case-insensitively so outputs stay distinct on
/// case-insensitive filesystems.
pub fn assign_output_paths(
    inputs: &[PathBuf],
    output_dir: &Path,
    resolution: TargetResolution,
) -> CoreResult<Vec<PathBuf>> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut outputs = Vec::with_capacity(inputs.len());

    for input in inputs {
        let stem = file_stem_safe(input)?;
        let mut index = 1;
        let name = loop {
            let candidate = output_file_name(&stem, resolution, index);
            if taken.insert(candidate.to_lowercase()) {
                break candidate;
            }
            index += 1;
        };
        outputs.push(output_dir.join(name));
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        let inputs = vec![PathBuf::from("/videos/beach.mov"), PathBuf::from("/videos/city.mp4")];
        let outputs =
            assign_output_paths(&inputs, Path::new("/out"), TargetResolution::PHONE_20_9).unwrap();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("/out/beach_1080x2400.mp4"),
                PathBuf::from("/out/city_1080x2400.mp4")
            ]
        );
    }

    #[test]
    fn test_same_stem_gets_suffix_in_input_order() {
        let inputs = vec![
            PathBuf::from("/a/clip.mp4"),
            PathBuf::from("/b/clip.mov"),
            PathBuf::from("/c/CLIP.mkv"),
        ];
        let outputs =
            assign_output_paths(&inputs, Path::new("out"), TargetResolution::PHONE_11_5).unwrap();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("out/clip_1080x2376.mp4"),
                PathBuf::from("out/clip_1080x2376_2.mp4"),
                PathBuf::from("out/CLIP_1080x2376_3.mp4"),
            ]
        );
    }

    #[test]
    fn test_input_without_file_name_is_error() {
        let inputs = vec![PathBuf::from("/")];
        assert!(assign_output_paths(&inputs, Path::new("out"), TargetResolution::PHONE_20_9).is_err());
    }
}
