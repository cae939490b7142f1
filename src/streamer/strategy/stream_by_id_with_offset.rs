use super::{ActionStrategy, StrategyDeps};
use crate::streamer::action::{Action, ActionPayload, Command};
use crate::streamer::error::StreamError;
use crate::streamer::proto::Connection;
use crate::tokenizer::Tokenizer;
use async_trait::async_trait;
use std::sync::Arc;

/// Streams a video from the chunk holding a requested playback time.
///
/// Only the owner of the video may seek into it; the request carries the
/// owner's access token.
pub struct StreamByIdWithOffsetStrategy {
    deps: StrategyDeps,
    tokenizer: Arc<dyn Tokenizer>,
}

impl StreamByIdWithOffsetStrategy {
    pub fn new(deps: StrategyDeps, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { deps, tokenizer }
    }
}

#[async_trait]
impl ActionStrategy for StreamByIdWithOffsetStrategy {
    fn name(&self) -> &'static str {
        "stream_by_id_with_offset"
    }

    fn is_appropriate(&self, action: &Action) -> bool {
        action.command() == Command::StreamByIdWithOffset
    }

    async fn execute(
        &self,
        action: &Action,
        conn: &mut Connection,
    ) -> Result<(), StreamError> {
        let ActionPayload::SeekStream(request) = action.payload() else {
            return Err(StreamError::UnexpectedAction(action.command()));
        };
        let user_id = self.tokenizer.verify(&request.auth_token)?;
        let video = self.deps.resolve(conn, &request.id, Some(user_id)).await?;

        let from = request.from_seconds;
        let duration = request.total_duration_seconds;
        self.deps
            .stream(conn, &video, |size, chunk| {
                seek_offset(size, chunk, from, duration)
            })
            .await
    }
}

/// Byte offset of the chunk playing at `from_seconds`.
///
/// Assumes a constant bitrate: the file is cut into whole chunks that each
/// play for the same time, and the stream restarts at the beginning of the
/// chunk containing the requested time. The result is a multiple of
/// `chunk_size` no larger than `file_size`; degenerate inputs start at 0.
pub fn seek_offset(
    file_size: u64,
    chunk_size: usize,
    from_seconds: f64,
    total_duration_seconds: f64,
) -> u64 {
    let chunk_size = chunk_size.max(1) as u64;
    let total_chunks = file_size / chunk_size;
    if total_chunks == 0 || !(total_duration_seconds > 0.0) {
        return 0;
    }

    let chunk_duration = total_duration_seconds / total_chunks as f64;
    let target_chunk = (from_seconds / chunk_duration).ceil();
    if !(target_chunk >= 1.0) {
        return 0;
    }

    (target_chunk as u64 - 1)
        .saturating_mul(chunk_size)
        .min(file_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamer::action::SeekRequest;
    use crate::streamer::proto::tests::{test_connection, test_peer, written};
    use crate::streamer::test_fixtures::{deps, media_file, patterned, video_at};
    use crate::tokenizer::JwtTokenizer;
    use axum::extract::ws::Message;
    use vidstream_common::UserId;

    fn tokenizer() -> Arc<JwtTokenizer> {
        Arc::new(JwtTokenizer::new("secret", "streaming_service", vec![], 60))
    }

    #[test]
    fn test_seek_offset_worked_example() {
        assert_eq!(seek_offset(10_000_000, 1_000_000, 50.0, 100.0), 4_000_000);
    }

    #[test]
    fn test_seek_offset_boundaries() {
        // 10 chunks of 10 s each.
        assert_eq!(seek_offset(10_000_000, 1_000_000, 0.0, 100.0), 0);
        assert_eq!(seek_offset(10_000_000, 1_000_000, 0.5, 100.0), 0);
        assert_eq!(seek_offset(10_000_000, 1_000_000, 10.0, 100.0), 0);
        assert_eq!(seek_offset(10_000_000, 1_000_000, 10.5, 100.0), 1_000_000);
        assert_eq!(seek_offset(10_000_000, 1_000_000, 100.0, 100.0), 9_000_000);
    }

    #[test]
    fn test_seek_offset_degenerate_inputs() {
        // Smaller than one chunk.
        assert_eq!(seek_offset(500, 1_000, 10.0, 100.0), 0);
        assert_eq!(seek_offset(10_000, 1_000, 10.0, 0.0), 0);
        assert_eq!(seek_offset(10_000, 1_000, 10.0, f64::NAN), 0);
        assert_eq!(seek_offset(10_000, 1_000, f64::NAN, 100.0), 0);
        // Past the end clamps to the file size.
        assert_eq!(seek_offset(10_000, 1_000, 500.0, 100.0), 10_000);
    }

    #[test]
    fn test_seek_offset_is_chunk_aligned() {
        for from in [1.0, 13.3, 47.9, 88.0] {
            let offset = seek_offset(7_340_032, 1_048_576, from, 120.0);
            assert_eq!(offset % 1_048_576, 0);
            assert!(offset <= 7_340_032);
        }
    }

    #[tokio::test]
    async fn test_streams_from_offset() {
        let content = patterned(100);
        let (_dir, path) = media_file(&content);
        let video = video_at(&path);
        let tokenizer = tokenizer();
        let token = tokenizer.issue(video.user_id).unwrap();
        let strategy = StreamByIdWithOffsetStrategy::new(deps(vec![video.clone()], 10), tokenizer);

        let (mut conn, mut rx) = test_connection();
        let action = Action::new(
            ActionPayload::SeekStream(SeekRequest {
                id: video.id,
                auth_token: token,
                from_seconds: 75.0,
                total_duration_seconds: 100.0,
            }),
            test_peer(),
        );
        assert!(strategy.is_appropriate(&action));
        strategy.execute(&action, &mut conn).await.unwrap();

        let frames = written(&mut rx);
        assert_eq!(frames.first(), Some(&Message::Text("start:mp4a:avc1".to_string())));
        assert_eq!(frames.last(), Some(&Message::Text("stop".to_string())));
        // ceil(75 / 10) = 8, so streaming starts at chunk 7.
        assert_eq!(frames.len(), 2 + 3);
        assert_eq!(frames[1], Message::Binary(content[70..80].to_vec()));
    }

    #[tokio::test]
    async fn test_invalid_token_sends_nothing() {
        let (_dir, path) = media_file(&patterned(100));
        let video = video_at(&path);
        let strategy = StreamByIdWithOffsetStrategy::new(deps(vec![video.clone()], 10), tokenizer());

        let (mut conn, mut rx) = test_connection();
        let action = Action::new(
            ActionPayload::SeekStream(SeekRequest {
                id: video.id,
                auth_token: "not.a.token".to_string(),
                from_seconds: 0.0,
                total_duration_seconds: 100.0,
            }),
            test_peer(),
        );

        assert!(matches!(
            strategy.execute(&action, &mut conn).await,
            Err(StreamError::Unauthorized(_))
        ));
        assert!(written(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_other_users_video_looks_missing() {
        let (_dir, path) = media_file(&patterned(100));
        let video = video_at(&path);
        let tokenizer = tokenizer();
        let token = tokenizer.issue(UserId::new()).unwrap();
        let strategy = StreamByIdWithOffsetStrategy::new(deps(vec![video.clone()], 10), tokenizer);

        let (mut conn, mut rx) = test_connection();
        let action = Action::new(
            ActionPayload::SeekStream(SeekRequest {
                id: video.id,
                auth_token: token,
                from_seconds: 0.0,
                total_duration_seconds: 100.0,
            }),
            test_peer(),
        );

        assert!(matches!(
            strategy.execute(&action, &mut conn).await,
            Err(StreamError::NotFound(_))
        ));
        assert_eq!(
            written(&mut rx),
            vec![Message::Text(format!("error:video {} not found", video.id))]
        );
    }
}
