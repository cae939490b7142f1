//! Shared fixtures for streamer unit tests.

use super::proto::Communicator;
use super::strategy::StrategyDeps;
use crate::catalog::InMemoryVideoRepository;
use crate::detector::{CodecDetector, CodecTags, DetectError};
use crate::reader::FileReader;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vidstream_common::{Resource, UserId, Video, VideoId};

/// Detector answering the same tags for every resource.
pub(crate) struct StaticDetector {
    tags: Option<CodecTags>,
}

impl StaticDetector {
    pub(crate) fn new(audio: &str, video: &str) -> Self {
        Self {
            tags: Some(CodecTags {
                audio: audio.to_string(),
                video: video.to_string(),
            }),
        }
    }

    pub(crate) fn failing() -> Self {
        Self { tags: None }
    }
}

#[async_trait]
impl CodecDetector for StaticDetector {
    async fn detect(&self, resource: &Resource) -> Result<CodecTags, DetectError> {
        self.tags
            .clone()
            .ok_or_else(|| DetectError::NoStreams(resource.filepath().to_path_buf()))
    }
}

/// Write `content` to a file in a fresh temp dir.
pub(crate) fn media_file(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("video.mp4");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content).unwrap();
    (dir, path)
}

/// Bytes that differ from one offset to the next.
pub(crate) fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub(crate) fn video_at(path: &Path) -> Video {
    let user_id = UserId::new();
    Video {
        id: VideoId::new(),
        name: "fixture".to_string(),
        user_id,
        resource: Resource::new("fixture.mp4", path, user_id),
    }
}

pub(crate) fn deps(videos: Vec<Video>, chunk_size: usize) -> StrategyDeps {
    deps_with_shutdown(videos, chunk_size, CancellationToken::new())
}

pub(crate) fn deps_with_shutdown(
    videos: Vec<Video>,
    chunk_size: usize,
    shutdown: CancellationToken,
) -> StrategyDeps {
    StrategyDeps {
        videos: Arc::new(videos.into_iter().collect::<InMemoryVideoRepository>()),
        detector: Arc::new(StaticDetector::new("mp4a", "avc1")),
        reader: FileReader::new(chunk_size, shutdown),
        communicator: Communicator::new(),
    }
}
