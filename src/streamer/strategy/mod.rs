//! Policies that turn an action into frames on the wire.
//!
//! Every strategy walks the same states: resolve the video (after checking
//! the caller's token for seeks), detect its codecs, announce them with
//! `start`, push the file as binary chunks from some offset, then `stop`.

mod stream_by_id;
mod stream_by_id_with_offset;

pub use stream_by_id::StreamByIdStrategy;
pub use stream_by_id_with_offset::{seek_offset, StreamByIdWithOffsetStrategy};

use super::action::Action;
use super::error::StreamError;
use super::proto::{Communicator, Connection};
use crate::catalog::VideoRepository;
use crate::detector::CodecDetector;
use crate::reader::{FileReader, MediaFile};
use async_trait::async_trait;
use std::sync::Arc;
use vidstream_common::{UserId, Video, VideoId};

/// A way of serving one kind of action.
#[async_trait]
pub trait ActionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy serves `action`.
    fn is_appropriate(&self, action: &Action) -> bool;

    /// Serve `action`, writing frames to `conn`.
    async fn execute(&self, action: &Action, conn: &mut Connection) -> Result<(), StreamError>;
}

/// Collaborators shared by the streaming strategies.
#[derive(Clone)]
pub struct StrategyDeps {
    pub videos: Arc<dyn VideoRepository>,
    pub detector: Arc<dyn CodecDetector>,
    pub reader: FileReader,
    pub communicator: Communicator,
}

impl StrategyDeps {
    /// Look a video up on behalf of the client.
    ///
    /// A missing video, or one that `owner` does not own, is reported to the
    /// client with a single `error` frame.
    pub(crate) async fn resolve(
        &self,
        conn: &mut Connection,
        id: &VideoId,
        owner: Option<UserId>,
    ) -> Result<Video, StreamError> {
        let found = match self.videos.find(id).await {
            Ok(video) if owner.map_or(true, |user| video.is_owned_by(user)) => Some(video),
            Ok(_) => {
                tracing::warn!(peer = %conn.peer(), video_id = %id, "Video requested by a user who does not own it");
                None
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(StreamError::Repository(e)),
        };

        match found {
            Some(video) => Ok(video),
            None => {
                let err = StreamError::NotFound(*id);
                self.communicator.error(conn, &err.to_string()).await?;
                Err(err)
            }
        }
    }

    /// Stream `video` to the client.
    ///
    /// `offset` maps the file size and chunk size to the first byte sent.
    /// Once `start` went out, `stop` is always attempted, whatever happens
    /// in between.
    pub(crate) async fn stream<F>(
        &self,
        conn: &mut Connection,
        video: &Video,
        offset: F,
    ) -> Result<(), StreamError>
    where
        F: FnOnce(u64, usize) -> u64 + Send,
    {
        let peer = conn.peer();
        let codecs = self.detector.detect(&video.resource).await?;
        self.communicator
            .start(conn, &codecs.audio, &codecs.video)
            .await?;

        let path = video.resource.filepath();
        let file = match MediaFile::open(path).await {
            Ok(file) => file,
            Err(source) => {
                self.stop(conn).await;
                return Err(StreamError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let offset = offset(file.size(), self.reader.chunk_size());
        tracing::info!(peer = %peer, video_id = %video.id, offset, size = file.size(), "Streaming video");

        let mut chunks = self.reader.read_by_chunks(&file, offset);
        let mut sent = 0usize;
        let mut result = Ok(());
        while let Some(chunk) = chunks.recv().await {
            if let Err(e) = self.communicator.send(conn, chunk).await {
                result = Err(StreamError::from(e));
                break;
            }
            sent += 1;
        }
        drop(chunks);

        self.stop(conn).await;
        tracing::debug!(peer = %peer, video_id = %video.id, chunks = sent, "Streaming finished");
        result
    }

    async fn stop(&self, conn: &mut Connection) {
        if let Err(e) = self.communicator.stop(conn).await {
            tracing::warn!(peer = %conn.peer(), error = %e, "Failed to send stop");
        }
    }
}
