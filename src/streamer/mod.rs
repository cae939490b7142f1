//! WebSocket streaming engine.
//!
//! Each connection gets a listener task decoding client frames into
//! [`Action`]s and a handler task serving them through an [`ActionStrategy`].
//! The two are joined by a channel of capacity 1, so a client can have at
//! most one action queued behind the one being streamed.

pub mod action;
mod error;
pub mod handler;
pub mod listener;
pub mod proto;
pub mod strategy;

#[cfg(test)]
mod test_fixtures;

pub use action::{Action, ActionError, ActionPayload, Command, SeekRequest, StreamRequest};
pub use error::StreamError;
pub use handler::ActionsHandler;
pub use listener::ActionsListener;
pub use proto::{Communicator, Connection, ProtoError};
pub use strategy::{
    seek_offset, ActionStrategy, StrategyDeps, StreamByIdStrategy, StreamByIdWithOffsetStrategy,
};

use crate::tokenizer::Tokenizer;
use axum::extract::ws::{Message, WebSocket};
use futures::{Stream, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves client connections.
#[derive(Clone)]
pub struct ResourceStreamer {
    listener: ActionsListener,
    handler: ActionsHandler,
}

impl ResourceStreamer {
    pub fn new(listener: ActionsListener, handler: ActionsHandler) -> Self {
        Self { listener, handler }
    }

    /// Streamer with the plain and seek strategies, in that order.
    pub fn with_default_strategies(deps: StrategyDeps, tokenizer: Arc<dyn Tokenizer>) -> Self {
        let communicator = deps.communicator;
        let strategies: Vec<Arc<dyn ActionStrategy>> = vec![
            Arc::new(StreamByIdStrategy::new(deps.clone())),
            Arc::new(StreamByIdWithOffsetStrategy::new(deps, tokenizer)),
        ];

        Self::new(
            ActionsListener::new(communicator),
            ActionsHandler::new(strategies),
        )
    }

    /// Serve an upgraded socket until the client goes away.
    pub async fn stream(&self, socket: WebSocket, peer: SocketAddr) {
        let (sink, frames) = socket.split();
        self.serve(Connection::new(peer, sink), frames).await;
    }

    /// Serve one connection given its two halves.
    ///
    /// The listener task owns the read half and the handler task owns the
    /// write half.
    ///
    /// Returns after the client disconnected and the action in progress, if
    /// any, has finished.
    pub async fn serve<S>(&self, conn: Connection, frames: S)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
    {
        let peer = conn.peer();
        tracing::info!(peer = %peer, "Client connected");

        let (actions, listening) = self.listener.listen(frames, peer);
        let handling = self.handler.handle(actions, conn);

        let (listened, handled) = tokio::join!(listening, handling);
        if let Err(e) = listened {
            tracing::error!(peer = %peer, error = %e, "Listener task failed");
        }
        if let Err(e) = handled {
            tracing::error!(peer = %peer, error = %e, "Handler task failed");
        }

        tracing::info!(peer = %peer, "Client disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamer::proto::tests::test_connection;
    use crate::streamer::test_fixtures::{deps, media_file, patterned, video_at};
    use crate::tokenizer::JwtTokenizer;
    use futures::channel::mpsc;

    #[tokio::test]
    async fn test_unsupported_frame_then_stream() {
        let content = patterned(25);
        let (_dir, path) = media_file(&content);
        let video = video_at(&path);
        let streamer = ResourceStreamer::with_default_strategies(
            deps(vec![video.clone()], 10),
            Arc::new(JwtTokenizer::new("secret", "streaming_service", vec![], 60)),
        );

        let (conn, mut out) = test_connection();
        let (tx, frames) = mpsc::unbounded();
        tx.unbounded_send(Ok(Message::Text("PLAY:now".to_string())))
            .unwrap();
        tx.unbounded_send(Ok(Message::Text(format!("ID:{}", video.id))))
            .unwrap();
        drop(tx);

        streamer.serve(conn, frames).await;

        let mut received = Vec::new();
        while let Ok(Some(frame)) = out.try_next() {
            received.push(frame);
        }
        assert_eq!(
            received,
            vec![
                Message::Text("start:mp4a:avc1".to_string()),
                Message::Binary(content[0..10].to_vec()),
                Message::Binary(content[10..20].to_vec()),
                Message::Binary(content[20..25].to_vec()),
                Message::Text("stop".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_returns_when_client_leaves_idle() {
        let streamer = ResourceStreamer::with_default_strategies(
            deps(vec![], 10),
            Arc::new(JwtTokenizer::new("secret", "streaming_service", vec![], 60)),
        );
        let (conn, _out) = test_connection();
        let (tx, frames) = mpsc::unbounded::<Result<Message, axum::Error>>();
        drop(tx);

        streamer.serve(conn, frames).await;
    }
}
