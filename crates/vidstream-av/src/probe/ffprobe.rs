//! FFprobe-based stream probing.

use super::types::*;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_tag_string: Option<String>,
}

/// Probe the streams of a media file using ffprobe.
///
/// `ffprobe` is the executable to run, either a bare name resolved through
/// `PATH` or a configured absolute path.
pub fn probe_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<StreamsInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffprobe")
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed("ffprobe", stderr.to_string()));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    parse_ffprobe_json(path, &json_str)
}

fn parse_ffprobe_json(path: &Path, json: &str) -> Result<StreamsInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let streams = output
        .streams
        .into_iter()
        .map(|stream| StreamInfo {
            index: stream.index,
            kind: match stream.codec_type.as_deref() {
                Some("video") => StreamKind::Video,
                Some("audio") => StreamKind::Audio,
                Some("subtitle") => StreamKind::Subtitle,
                _ => StreamKind::Other,
            },
            codec_name: stream.codec_name,
            codec_tag: stream.codec_tag_string.and_then(normalize_tag),
        })
        .collect();

    Ok(StreamsInfo {
        file_path: path.to_path_buf(),
        streams,
    })
}

/// ffprobe prints `[0][0][0][0]` for streams without a fourcc.
fn normalize_tag(tag: String) -> Option<String> {
    if tag.is_empty() || tag.starts_with('[') {
        None
    } else {
        Some(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4_OUTPUT: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "codec_tag_string": "avc1"},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "codec_tag_string": "mp4a"},
            {"index": 2, "codec_type": "audio", "codec_name": "ac3", "codec_tag_string": "ac-3"}
        ]
    }"#;

    #[test]
    fn test_parse_first_streams() {
        let info = parse_ffprobe_json(Path::new("movie.mp4"), MP4_OUTPUT).unwrap();
        assert_eq!(info.streams.len(), 3);
        assert_eq!(info.video_tag(), "avc1");
        assert_eq!(info.audio_tag(), "mp4a");
        assert_eq!(info.first_audio().unwrap().index, 1);
    }

    #[test]
    fn test_parse_audio_only() {
        let json = r#"{"streams": [{"index": 0, "codec_type": "audio", "codec_name": "mp3", "codec_tag_string": "mp4a"}]}"#;
        let info = parse_ffprobe_json(Path::new("song.m4a"), json).unwrap();
        assert_eq!(info.audio_tag(), "mp4a");
        assert_eq!(info.video_tag(), "");
        assert!(info.first_video().is_none());
    }

    #[test]
    fn test_placeholder_tag_is_dropped() {
        let json = r#"{"streams": [{"index": 0, "codec_type": "video", "codec_name": "vp9", "codec_tag_string": "[0][0][0][0]"}]}"#;
        let info = parse_ffprobe_json(Path::new("clip.webm"), json).unwrap();
        assert_eq!(info.video_tag(), "");
        assert_eq!(info.first_video().unwrap().codec_name.as_deref(), Some("vp9"));
    }

    #[test]
    fn test_parse_missing_streams() {
        let info = parse_ffprobe_json(Path::new("empty.bin"), "{}").unwrap();
        assert!(info.streams.is_empty());
        assert_eq!(info.audio_tag(), "");
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_ffprobe_json(Path::new("x"), "not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_probe_missing_file() {
        let result = probe_with_ffprobe(Path::new("ffprobe"), Path::new("/no/such/file.mp4"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
