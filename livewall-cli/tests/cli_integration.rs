use assert_cmd::Command;
use predicates::str::contains;
use std::error::Error;
use std::path::Path;
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn livewall_cmd() -> Command {
    let mut cmd = Command::cargo_bin("livewall").expect("Failed to find livewall binary");
    cmd.env_remove("LIVEWALL_FFMPEG")
        .env_remove("LIVEWALL_FFPROBE")
        .env_remove("LIVEWALL_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    livewall_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("convert"))
        .stdout(contains("probe"))
        .stdout(contains("encoders"));
}

#[test]
fn test_convert_requires_output_dir() {
    livewall_cmd()
        .args(["convert", "clip.mp4"])
        .assert()
        .code(2)
        .stderr(contains("--output"));
}

#[test]
fn test_invalid_target_is_usage_error() {
    livewall_cmd()
        .args(["convert", "clip.mp4", "-o", "out", "--target", "1081x2400"])
        .assert()
        .code(2);
}

#[test]
fn test_crf_and_bitrate_conflict() {
    livewall_cmd()
        .args(["convert", "clip.mp4", "-o", "out", "--crf", "20", "--bitrate", "6000"])
        .assert()
        .code(2)
        .stderr(contains("cannot be used with"));
}

#[test]
fn test_missing_input_is_fatal() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;
    livewall_cmd()
        .args(["convert", "surely/this/does/not/exist.mp4", "-o"])
        .arg(output_dir.path())
        .assert()
        .code(2)
        .stderr(contains("does not exist"));
    Ok(())
}

#[test]
fn test_missing_ffmpeg_is_fatal() -> Result<(), Box<dyn Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let clip = input_dir.path().join("clip.mp4");
    std::fs::write(&clip, "dummy content")?;

    livewall_cmd()
        .arg("convert")
        .arg(&clip)
        .arg("-o")
        .arg(output_dir.path())
        .args(["--ffmpeg", "/no/such/dir/ffmpeg"])
        .assert()
        .code(2)
        .stderr(contains("ffmpeg"));
    Ok(())
}

#[test]
fn test_encoders_with_missing_ffmpeg_is_fatal() {
    livewall_cmd()
        .args(["encoders", "--ffmpeg", "/no/such/dir/ffmpeg"])
        .assert()
        .code(2);
}

// ---- Runs against shell-script stand-ins for ffmpeg and ffprobe ----

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const FAKE_FFMPEG: &str = r#"#!/bin/sh
case "$*" in
  *-version*) echo "ffmpeg version 7.0-fake"; exit 0 ;;
  *-encoders*)
    echo "Encoders:"
    echo " ------"
    echo " V....D libx264              libx264 H.264 / AVC"
    echo " V....D libx265              libx265 H.265 / HEVC"
    echo " A....D aac                  AAC (Advanced Audio Coding)"
    exit 0 ;;
esac
exit 1
"#;

    const FAKE_FFPROBE: &str = r#"#!/bin/sh
case "$*" in
  *-version*) echo "ffprobe version 7.0-fake"; exit 0 ;;
esac
echo '{"streams":[{"codec_type":"video","codec_name":"h264","width":1920,"height":1080,"r_frame_rate":"30/1"}],"format":{"duration":"10.0"}}'
"#;

    fn write_script(
        dir: &Path,
        name: &str,
        body: &str,
    ) -> Result<std::path::PathBuf, Box<dyn Error>> {
        let path = dir.join(name);
        std::fs::write(&path, body)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    fn fake_tools(dir: &Path) -> Result<Command, Box<dyn Error>> {
        let ffmpeg = write_script(dir, "ffmpeg", FAKE_FFMPEG)?;
        let ffprobe = write_script(dir, "ffprobe", FAKE_FFPROBE)?;
        let mut cmd = livewall_cmd();
        cmd.env("LIVEWALL_FFMPEG", ffmpeg).env("LIVEWALL_FFPROBE", ffprobe);
        Ok(cmd)
    }

    #[test]
    fn test_dry_run_prints_planned_command() -> Result<(), Box<dyn Error>> {
        let tools_dir = tempdir()?;
        let input_dir = tempdir()?;
        let output_root = tempdir()?;
        let output_dir = output_root.path().join("wallpapers");
        std::fs::write(input_dir.path().join("beach.mp4"), "dummy content")?;

        fake_tools(tools_dir.path())?
            .arg("convert")
            .arg(input_dir.path())
            .arg("-o")
            .arg(&output_dir)
            .args(["--dry-run", "--json"])
            .assert()
            .success()
            .stdout(contains("\"dry_run\": true"))
            .stdout(contains("crop=486:1080:717:0,scale=1080:2400:flags=lanczos,setsar=1"))
            .stdout(contains("beach_1080x2400.mp4"))
            .stdout(contains("libx264"));

        assert!(!output_dir.exists());
        Ok(())
    }

    #[test]
    fn test_probe_reports_geometry() -> Result<(), Box<dyn Error>> {
        let tools_dir = tempdir()?;
        let input_dir = tempdir()?;
        let clip = input_dir.path().join("city.mov");
        std::fs::write(&clip, "dummy content")?;

        fake_tools(tools_dir.path())?
            .arg("probe")
            .arg(&clip)
            .args(["--fit", "pad", "--json"])
            .assert()
            .success()
            .stdout(contains("\"kind\": \"pad\""))
            .stdout(contains("pad=1080:2400:0:897:color=black"));
        Ok(())
    }

    #[test]
    fn test_probe_missing_file_exits_with_failure() -> Result<(), Box<dyn Error>> {
        let tools_dir = tempdir()?;
        fake_tools(tools_dir.path())?
            .args(["probe", "surely/missing.mp4"])
            .assert()
            .code(1)
            .stdout(contains("error"));
        Ok(())
    }

    #[test]
    fn test_encoders_reports_software_fallback() -> Result<(), Box<dyn Error>> {
        let tools_dir = tempdir()?;
        fake_tools(tools_dir.path())?
            .args(["encoders", "--json", "--codec", "hevc"])
            .assert()
            .success()
            .stdout(contains("\"auto\": \"libx265\""));
        Ok(())
    }
}
