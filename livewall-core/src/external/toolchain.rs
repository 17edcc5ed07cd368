//! Locating the ffmpeg and ffprobe binaries.
//!
//! Search order for each tool: an explicit path, `./ffmpeg/bin/<tool>`,
//! `./ffmpeg/<tool>`, next to the running executable (and its
//! `ffmpeg/bin`), then `PATH`. A located binary must answer `-version`.

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::check_dependency;
use crate::error::{CoreError, CoreResult};

/// Resolved external tools.
#[derive(Debug, Clone, Serialize)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// First line of `ffmpeg -version`.
    pub ffmpeg_version: String,
}

impl Toolchain {
    /// Finds both tools. Any miss is a process-level `DependencyNotFound`.
    pub fn locate(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> CoreResult<Self> {
        let cwd = env::current_dir().ok();
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));

        let (ffmpeg, ffmpeg_version) =
            locate_binary("ffmpeg", ffmpeg, cwd.as_deref(), exe_dir.as_deref())?;
        let (ffprobe, _) = locate_binary("ffprobe", ffprobe, cwd.as_deref(), exe_dir.as_deref())?;

        log::info!("Using ffmpeg: {}", ffmpeg.display());
        log::info!("Using ffprobe: {}", ffprobe.display());
        log::debug!("{ffmpeg_version}");

        Ok(Self {
            ffmpeg,
            ffprobe,
            ffmpeg_version,
        })
    }
}

fn executable_name(tool: &str) -> String {
    format!("{tool}{}", env::consts::EXE_SUFFIX)
}

/// Bundled locations checked before `PATH`, in order.
#[must_use]
pub fn candidate_paths(tool: &str, cwd: Option<&Path>, exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let name = executable_name(tool);
    let mut candidates = Vec::new();
    if let Some(cwd) = cwd {
        candidates.push(cwd.join("ffmpeg").join("bin").join(&name));
        candidates.push(cwd.join("ffmpeg").join(&name));
    }
    if let Some(dir) = exe_dir {
        candidates.push(dir.join(&name));
        candidates.push(dir.join("ffmpeg").join("bin").join(&name));
    }
    candidates
}

fn locate_binary(
    tool: &str,
    explicit: Option<&Path>,
    cwd: Option<&Path>,
    exe_dir: Option<&Path>,
) -> CoreResult<(PathBuf, String)> {
    let path = match explicit {
        Some(path) => resolve_explicit(tool, path)?,
        None => candidate_paths(tool, cwd, exe_dir)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .or_else(|| which::which(tool).ok())
            .ok_or_else(|| {
                log::warn!("Dependency '{tool}' not found in bundled locations or PATH");
                CoreError::DependencyNotFound(tool.to_string())
            })?,
    };

    let version = check_dependency(&path).map_err(|e| {
        log::error!("{} did not answer -version: {e}", path.display());
        CoreError::DependencyNotFound(format!("{tool} ({})", path.display()))
    })?;
    Ok((path, version))
}

/// An explicit path may be a file or a bare program name looked up on `PATH`.
fn resolve_explicit(tool: &str, path: &Path) -> CoreResult<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.components().count() == 1 {
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
    }
    Err(CoreError::DependencyNotFound(format!(
        "{tool} ({})",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        let cwd = Path::new("/work");
        let exe = Path::new("/opt/livewall");
        let name = executable_name("ffprobe");
        assert_eq!(
            candidate_paths("ffprobe", Some(cwd), Some(exe)),
            vec![
                cwd.join("ffmpeg").join("bin").join(&name),
                cwd.join("ffmpeg").join(&name),
                exe.join(&name),
                exe.join("ffmpeg").join("bin").join(&name),
            ]
        );
        assert!(candidate_paths("ffmpeg", None, None).is_empty());
    }

    #[test]
    fn test_missing_explicit_path_is_dependency_error() {
        let err = Toolchain::locate(Some(Path::new("/no/such/ffmpeg")), None).unwrap_err();
        assert!(matches!(err, CoreError::DependencyNotFound(_)));
    }
}
