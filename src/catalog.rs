//! Video lookup.

use crate::config::VideoEntry;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use vidstream_common::{Error, Resource, Result, Video, VideoId};

/// Source of video records for the streaming strategies.
///
/// Implementations report a missing video as [`Error::NotFound`].
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn find(&self, id: &VideoId) -> Result<Video>;
}

/// Immutable catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: HashMap<VideoId, Video>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from `[[videos]]` config entries.
    pub fn from_entries(entries: &[VideoEntry]) -> anyhow::Result<Self> {
        let mut videos = HashMap::with_capacity(entries.len());
        for entry in entries {
            let id: VideoId = entry
                .id
                .parse()
                .with_context(|| format!("Video '{}' has an invalid id", entry.name))?;
            let user_id = entry
                .user_id
                .parse()
                .with_context(|| format!("Video '{}' has an invalid user id", entry.name))?;

            let resource = Resource::new(entry.name.clone(), entry.path.clone(), user_id);
            videos.insert(
                id,
                Video {
                    id,
                    name: entry.name.clone(),
                    user_id,
                    resource,
                },
            );
        }
        Ok(Self { videos })
    }

    pub fn insert(&mut self, video: Video) {
        self.videos.insert(video.id, video);
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

impl FromIterator<Video> for InMemoryVideoRepository {
    fn from_iter<I: IntoIterator<Item = Video>>(iter: I) -> Self {
        Self {
            videos: iter.into_iter().map(|v| (v.id, v)).collect(),
        }
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn find(&self, id: &VideoId) -> Result<Video> {
        self.videos
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("video {}", id)))
    }
}
