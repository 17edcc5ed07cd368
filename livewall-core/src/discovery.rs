//! Input discovery: turns the paths given on the command line into the
//! ordered list of source files for a batch.
//!
//! Files named explicitly are taken as-is (ffprobe decides whether they are
//! usable). Directories are scanned for files with a video extension, either
//! at the top level only or recursively.

use crate::error::{CoreError, CoreResult};
use crate::utils::has_video_extension;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds video files in `input_dir`, sorted by path.
///
/// Every matching file is returned, including empty or unreadable ones, so
/// that each gets its own result in the batch.
///
/// # Errors
///
/// * `CoreError::Walkdir` if the directory cannot be traversed
/// * `CoreError::NoFilesFound` if nothing matched
pub fn find_processable_files(input_dir: &Path, recursive: bool) -> CoreResult<Vec<PathBuf>> {
    let mut walker = WalkDir::new(input_dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_video_extension(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    files.sort();

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(files)
    }
}

/// Expands a mix of files and directories into a de-duplicated input list,
/// preserving the order in which the inputs were given.
pub fn collect_inputs(inputs: &[PathBuf], recursive: bool) -> CoreResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            match find_processable_files(input, recursive) {
                Ok(found) => {
                    for path in found {
                        if seen.insert(path.clone()) {
                            files.push(path);
                        }
                    }
                }
                Err(CoreError::NoFilesFound) => {
                    log::warn!("No video files found in {}", input.display());
                }
                Err(e) => return Err(e),
            }
        } else if input.exists() {
            if seen.insert(input.clone()) {
                files.push(input.clone());
            }
        } else {
            return Err(CoreError::PathError(format!(
                "Input does not exist: {}",
                input.display()
            )));
        }
    }

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(files)
    }
}
