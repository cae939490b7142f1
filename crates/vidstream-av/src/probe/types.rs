//! Types describing the streams of a probed media file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// One elementary stream found in a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: u32,
    pub kind: StreamKind,
    /// Codec name as reported by the prober (e.g. `h264`).
    pub codec_name: Option<String>,
    /// Codec tag (fourcc) as reported by the prober (e.g. `avc1`).
    pub codec_tag: Option<String>,
}

/// Streams of a media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsInfo {
    pub file_path: PathBuf,
    pub streams: Vec<StreamInfo>,
}

impl StreamsInfo {
    /// First audio stream, if any.
    pub fn first_audio(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Audio)
    }

    /// First video stream, if any.
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.kind == StreamKind::Video)
    }

    /// Codec tag of the first audio stream, empty when there is none.
    pub fn audio_tag(&self) -> &str {
        self.first_audio()
            .and_then(|s| s.codec_tag.as_deref())
            .unwrap_or("")
    }

    /// Codec tag of the first video stream, empty when there is none.
    pub fn video_tag(&self) -> &str {
        self.first_video()
            .and_then(|s| s.codec_tag.as_deref())
            .unwrap_or("")
    }
}
