use super::{ActionStrategy, StrategyDeps};
use crate::streamer::action::{Action, ActionPayload, Command};
use crate::streamer::error::StreamError;
use crate::streamer::proto::Connection;
use async_trait::async_trait;

/// Streams a whole video, from its first byte.
pub struct StreamByIdStrategy {
    deps: StrategyDeps,
}

impl StreamByIdStrategy {
    pub fn new(deps: StrategyDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ActionStrategy for StreamByIdStrategy {
    fn name(&self) -> &'static str {
        "stream_by_id"
    }

    fn is_appropriate(&self, action: &Action) -> bool {
        action.command() == Command::StreamById
    }

    async fn execute(
        &self,
        action: &Action,
        conn: &mut Connection,
    ) -> Result<(), StreamError> {
        let ActionPayload::Stream(request) = action.payload() else {
            return Err(StreamError::UnexpectedAction(action.command()));
        };
        let video = self.deps.resolve(conn, &request.id, None).await?;
        self.deps.stream(conn, &video, |_, _| 0).await
    }
}
