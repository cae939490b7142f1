//! Streaming protocol frames.
//!
//! Outbound text frames are `start:<audio>:<video>`, `error:<message>` and
//! `stop`; media bytes travel as binary frames, one per chunk. Inbound text
//! frames are `<command>[:<payload>]`.

use super::action::{Command, Request};
use crate::reader::Chunk;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;

/// Errors writing frames to a connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("socket write failed: {0}")]
    Socket(#[from] axum::Error),

    #[error("chunk carries a read error: {0}")]
    Chunk(io::Error),
}

type FrameSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;

/// Write half of a client connection.
///
/// Owned by the task serving the connection's actions, which is the only
/// writer.
pub struct Connection {
    peer: SocketAddr,
    sink: FrameSink,
}

impl Connection {
    pub fn new<S>(peer: SocketAddr, sink: S) -> Self
    where
        S: Sink<Message, Error = axum::Error> + Send + 'static,
    {
        Self {
            peer,
            sink: Box::pin(sink),
        }
    }

    /// Remote address of the client.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Write one frame and flush it.
    pub async fn send(&mut self, message: Message) -> Result<(), axum::Error> {
        self.sink.send(message).await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

/// Encodes outbound frames and splits inbound ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct Communicator;

impl Communicator {
    pub fn new() -> Self {
        Self
    }

    /// Announce the codecs of the stream that follows.
    pub async fn start(
        &self,
        conn: &mut Connection,
        audio_codec: &str,
        video_codec: &str,
    ) -> Result<(), ProtoError> {
        let frame = format!("start:{}:{}", audio_codec, video_codec);
        conn.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Send a chunk's bytes as one binary frame.
    pub async fn send(&self, conn: &mut Connection, mut chunk: Chunk) -> Result<(), ProtoError> {
        if let Some(err) = chunk.take_error() {
            return Err(ProtoError::Chunk(err));
        }
        conn.send(Message::Binary(chunk.into_data().into())).await?;
        Ok(())
    }

    pub async fn error(&self, conn: &mut Connection, message: &str) -> Result<(), ProtoError> {
        conn.send(Message::Text(format!("error:{}", message))).await?;
        Ok(())
    }

    pub async fn stop(&self, conn: &mut Connection) -> Result<(), ProtoError> {
        conn.send(Message::Text("stop".to_string())).await?;
        Ok(())
    }

    /// Split an inbound text frame into command and payload.
    ///
    /// Only the first `:` separates; the payload keeps any further colons.
    /// A frame without a separator is all command with an empty payload.
    pub fn parse<'a>(&self, text: &'a str) -> Request<'a> {
        let (command, payload) = text.split_once(':').unwrap_or((text, ""));
        Request {
            command: Command::from(command),
            payload,
        }
    }
}
