//! ffprobe integration.
//!
//! Runs `ffprobe -v error -print_format json -show_format -show_streams` and
//! turns the JSON into a [`SourceMedia`]. Parsing is tolerant: every field is
//! optional in the serde model and only the values needed for planning
//! (dimensions, frame rate, duration) are required.

use crate::cancel::RunControl;
use crate::error::{CoreError, CoreResult, probe_error};
use crate::media::{AudioStream, FrameRate, SourceMedia};
use crate::util::command::run_command;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Something that can describe a media file.
///
/// `Sync` so a single prober can be shared by the parallel batch runner.
pub trait Prober: Sync {
    fn probe(&self, path: &Path, control: &RunControl) -> CoreResult<SourceMedia>;
}

/// Production prober backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe: PathBuf,
}

impl FfprobeProber {
    #[must_use]
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.ffprobe
    }
}

impl Prober for FfprobeProber {
    fn probe(&self, path: &Path, control: &RunControl) -> CoreResult<SourceMedia> {
        if !path.is_file() {
            return Err(probe_error(path, "file does not exist or is not a regular file"));
        }
        std::fs::File::open(path).map_err(|e| probe_error(path, format!("unreadable: {e}")))?;

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path);

        let output = match run_command(&mut cmd, "ffprobe", control) {
            Ok(output) => output,
            Err(e @ (CoreError::Timeout { .. } | CoreError::Cancelled)) => return Err(e),
            Err(e) => return Err(probe_error(path, e.to_string())),
        };

        if !output.status.success() {
            let reason = match output.stderr.trim() {
                "" => format!("ffprobe exited with {}", output.status),
                stderr => stderr.to_string(),
            };
            return Err(probe_error(path, reason));
        }

        let mut media = parse_probe_json(path, &output.stdout)?;
        if media.size_bytes.is_none() {
            media.size_bytes = std::fs::metadata(path).ok().map(|m| m.len());
        }
        log::debug!(
            "Probed {}: {}x{} @ {} fps, {:.3}s, rotation {}",
            path.display(),
            media.width,
            media.height,
            media.frame_rate,
            media.duration_secs,
            media.rotation
        );
        Ok(media)
    }
}

// ---- serde model of the ffprobe JSON ----

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
    channels: Option<i64>,
    tags: Option<StreamTags>,
    side_data_list: Vec<SideData>,
    disposition: Option<Disposition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StreamTags {
    rotate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SideData {
    rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Disposition {
    attached_pic: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

impl ProbeStream {
    fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
            && self.disposition.as_ref().is_none_or(|d| d.attached_pic == 0)
    }

    fn is_audio(&self) -> bool {
        self.codec_type.as_deref() == Some("audio")
    }

    fn frame_rate(&self) -> Option<FrameRate> {
        self.r_frame_rate
            .as_deref()
            .and_then(FrameRate::parse)
            .or_else(|| self.avg_frame_rate.as_deref().and_then(FrameRate::parse))
    }

    fn rotation(&self) -> u32 {
        let raw = self
            .side_data_list
            .iter()
            .find_map(|sd| sd.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0);
        if !raw.is_finite() {
            return 0;
        }
        (raw.round() as i64).rem_euclid(360) as u32
    }
}

fn positive_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn positive_dimension(value: Option<i64>) -> Option<u32> {
    value.filter(|v| *v > 0).and_then(|v| u32::try_from(v).ok())
}

/// Builds a [`SourceMedia`] from ffprobe's JSON output.
pub fn parse_probe_json(path: &Path, json: &str) -> CoreResult<SourceMedia> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| probe_error(path, format!("unparseable ffprobe output: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.is_video())
        .ok_or_else(|| probe_error(path, "no video stream"))?;

    let width = positive_dimension(video.width)
        .ok_or_else(|| probe_error(path, "video width unknown"))?;
    let height = positive_dimension(video.height)
        .ok_or_else(|| probe_error(path, "video height unknown"))?;
    let frame_rate = video
        .frame_rate()
        .ok_or_else(|| probe_error(path, "frame rate unknown"))?;

    let format = parsed.format.as_ref();
    let duration_secs = positive_seconds(video.duration.as_deref())
        .or_else(|| positive_seconds(format.and_then(|f| f.duration.as_deref())))
        .ok_or_else(|| probe_error(path, "duration unknown"))?;

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.is_audio())
        .and_then(|s| {
            s.codec_name.as_ref().map(|codec| AudioStream {
                codec_name: codec.clone(),
                channels: s.channels.and_then(|c| u32::try_from(c).ok()),
            })
        });

    Ok(SourceMedia {
        path: path.to_path_buf(),
        width,
        height,
        duration_secs,
        frame_rate,
        rotation: video.rotation(),
        frame_count: video
            .nb_frames
            .as_deref()
            .and_then(|n| n.trim().parse::<u64>().ok())
            .filter(|n| *n > 0),
        video_codec: video.codec_name.clone(),
        audio,
        size_bytes: format
            .and_then(|f| f.size.as_deref())
            .and_then(|s| s.trim().parse::<u64>().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001",
                "duration": "12.345000",
                "nb_frames": "370"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "channels": 2
            }
        ],
        "format": { "duration": "12.400000", "size": "1048576" }
    }"#;

    fn parse(json: &str) -> CoreResult<SourceMedia> {
        parse_probe_json(Path::new("clip.mp4"), json)
    }

    #[test]
    fn test_parse_full_output() {
        let media = parse(FULL).unwrap();
        assert_eq!((media.width, media.height), (1920, 1080));
        assert_eq!(media.frame_rate, FrameRate::new(30000, 1001).unwrap());
        assert!((media.duration_secs - 12.345).abs() < 1e-9);
        assert_eq!(media.frame_count, Some(370));
        assert_eq!(media.video_codec.as_deref(), Some("h264"));
        assert_eq!(
            media.audio,
            Some(AudioStream {
                codec_name: "aac".into(),
                channels: Some(2)
            })
        );
        assert_eq!(media.size_bytes, Some(1_048_576));
        assert_eq!(media.rotation, 0);
    }

    #[test]
    fn test_duration_falls_back_to_format() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360, "r_frame_rate": "25/1"}],
            "format": {"duration": "4.0"}
        }"#;
        let media = parse(json).unwrap();
        assert_eq!(media.duration_secs, 4.0);
        assert!(media.audio.is_none());
        assert!(media.frame_count.is_none());
    }

    #[test]
    fn test_zero_rate_falls_back_to_average() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360,
                         "r_frame_rate": "0/0", "avg_frame_rate": "24/1", "duration": "1.0"}]
        }"#;
        assert_eq!(parse(json).unwrap().frame_rate, FrameRate::integer(24));
    }

    #[test]
    fn test_rotation_from_side_data_and_tags() {
        let side = r#"{
            "streams": [{"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1",
                         "duration": "2.0", "side_data_list": [{"side_data_type": "Display Matrix", "rotation": -90}]}]
        }"#;
        let media = parse(side).unwrap();
        assert_eq!(media.rotation, 270);
        assert_eq!(media.display_dimensions(), (1080, 1920));

        let tagged = r#"{
            "streams": [{"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1",
                         "duration": "2.0", "tags": {"rotate": "180"}}]
        }"#;
        let media = parse(tagged).unwrap();
        assert_eq!(media.rotation, 180);
        assert_eq!(media.display_dimensions(), (1920, 1080));
    }

    #[test]
    fn test_cover_art_is_not_the_video_stream() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "codec_name": "mjpeg", "width": 600, "height": 600,
                 "r_frame_rate": "90000/1", "disposition": {"attached_pic": 1}},
                {"codec_type": "video", "codec_name": "hevc", "width": 3840, "height": 2160,
                 "r_frame_rate": "60/1", "duration": "3.0"}
            ]
        }"#;
        let media = parse(json).unwrap();
        assert_eq!(media.video_codec.as_deref(), Some("hevc"));
        assert_eq!(media.width, 3840);
    }

    #[test]
    fn test_probe_errors() {
        let cases = [
            ("not json", "unparseable"),
            (r#"{"streams": [{"codec_type": "audio", "codec_name": "aac"}]}"#, "no video stream"),
            (
                r#"{"streams": [{"codec_type": "video", "width": 0, "height": 10, "r_frame_rate": "25/1", "duration": "1"}]}"#,
                "width",
            ),
            (
                r#"{"streams": [{"codec_type": "video", "width": 10, "height": 10, "r_frame_rate": "0/0", "duration": "1"}]}"#,
                "frame rate",
            ),
            (
                r#"{"streams": [{"codec_type": "video", "width": 10, "height": 10, "r_frame_rate": "25/1"}]}"#,
                "duration",
            ),
        ];
        for (json, expected) in cases {
            match parse(json) {
                Err(CoreError::Probe { reason, .. }) => {
                    assert!(reason.contains(expected), "{reason} should mention {expected}");
                }
                other => panic!("expected probe error for {json}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_file_is_probe_error() {
        let prober = FfprobeProber::new("ffprobe");
        let err = prober
            .probe(Path::new("/no/such/clip.mp4"), &RunControl::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Probe { .. }));
    }
}
