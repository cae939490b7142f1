//! Codec detection for the `start` frame.

use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use vidstream_common::Resource;

/// Codec tags of the first audio and video streams.
///
/// A missing stream is an empty tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecTags {
    pub audio: String,
    pub video: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error(transparent)]
    Probe(#[from] vidstream_av::Error),

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("no audio or video stream in {0:?}")]
    NoStreams(PathBuf),
}

/// Finds the codecs of a stored resource.
#[async_trait]
pub trait CodecDetector: Send + Sync {
    async fn detect(&self, resource: &Resource) -> Result<CodecTags, DetectError>;
}

/// Detector backed by the ffprobe executable.
#[derive(Debug, Clone)]
pub struct FfprobeDetector {
    ffprobe: PathBuf,
}

impl FfprobeDetector {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    /// Use the configured ffprobe, or the one on `PATH`.
    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(
            tools
                .ffprobe
                .clone()
                .unwrap_or_else(|| PathBuf::from("ffprobe")),
        )
    }
}

impl Default for FfprobeDetector {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl CodecDetector for FfprobeDetector {
    async fn detect(&self, resource: &Resource) -> Result<CodecTags, DetectError> {
        let ffprobe = self.ffprobe.clone();
        let path = resource.filepath().to_path_buf();

        let info = tokio::task::spawn_blocking(move || {
            vidstream_av::probe::probe_with_ffprobe(&ffprobe, &path)
        })
        .await??;

        if info.first_audio().is_none() && info.first_video().is_none() {
            return Err(DetectError::NoStreams(info.file_path));
        }

        let tags = CodecTags {
            audio: info.audio_tag().to_string(),
            video: info.video_tag().to_string(),
        };
        tracing::debug!(
            path = %resource.filepath().display(),
            audio = %tags.audio,
            video = %tags.video,
            "Detected codecs"
        );
        Ok(tags)
    }
}
