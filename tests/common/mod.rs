//! Shared test harness for integration tests.
//!
//! [`TestHarness::start`] writes media fixtures to a temp dir, wires the
//! streaming engine around them with a fixed codec detector, and serves it on
//! a random port. Clients talk to it through `tokio-tungstenite`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use vidstream::catalog::InMemoryVideoRepository;
use vidstream::config::Config;
use vidstream::detector::{CodecDetector, CodecTags, DetectError};
use vidstream::reader::FileReader;
use vidstream::server::{self, AppContext};
use vidstream::streamer::{Communicator, ResourceStreamer, StrategyDeps};
use vidstream::tokenizer::{JwtTokenizer, Tokenizer};
use vidstream_common::{Resource, UserId, Video};

pub const SECRET: &str = "integration-test-secret";
pub const AUDIO_TAG: &str = "mp4a";
pub const VIDEO_TAG: &str = "avc1";

const FRAME_TIMEOUT: Duration = Duration::from_secs(10);

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A frame as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Answers the same codec tags for every file.
struct FixedDetector;

#[async_trait]
impl CodecDetector for FixedDetector {
    async fn detect(&self, _resource: &Resource) -> Result<CodecTags, DetectError> {
        Ok(CodecTags {
            audio: AUDIO_TAG.to_string(),
            video: VIDEO_TAG.to_string(),
        })
    }
}

/// A running server plus the fixtures it serves.
pub struct TestHarness {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub videos: Vec<Video>,
    pub contents: Vec<Vec<u8>>,
    pub tokenizer: JwtTokenizer,
    _media: TempDir,
}

impl TestHarness {
    /// Serve one video per entry of `contents`, each owned by its own user.
    pub async fn start(contents: Vec<Vec<u8>>, chunk_size: usize) -> Self {
        let media = TempDir::new().expect("failed to create media dir");
        let videos: Vec<Video> = contents
            .iter()
            .enumerate()
            .map(|(i, content)| {
                let path = media.path().join(format!("video-{}.mp4", i));
                std::fs::write(&path, content).expect("failed to write media fixture");
                let user_id = UserId::new();
                Video {
                    id: vidstream_common::VideoId::new(),
                    name: format!("video {}", i),
                    user_id,
                    resource: Resource::new(format!("video-{}.mp4", i), path, user_id),
                }
            })
            .collect();

        let mut config = Config::default();
        config.reader.chunk_size = chunk_size;
        config.auth.secret = SECRET.to_string();

        let shutdown = CancellationToken::new();
        let deps = StrategyDeps {
            videos: Arc::new(videos.iter().cloned().collect::<InMemoryVideoRepository>()),
            detector: Arc::new(FixedDetector),
            reader: FileReader::new(chunk_size, shutdown.clone()),
            communicator: Communicator::new(),
        };
        let streamer = ResourceStreamer::with_default_strategies(
            deps,
            Arc::new(JwtTokenizer::from_config(&config.auth)),
        );
        let tokenizer = JwtTokenizer::from_config(&config.auth);
        let ctx = AppContext::new(config, streamer, shutdown.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let signal = shutdown.clone();
        tokio::spawn(async move {
            server::serve(listener, ctx, async move { signal.cancelled().await })
                .await
                .ok();
        });

        Self {
            addr,
            shutdown,
            videos,
            contents,
            tokenizer,
            _media: media,
        }
    }

    /// Open a WebSocket connection to the streaming endpoint.
    pub async fn connect(&self) -> Client {
        let (client, _response) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("failed to connect");
        client
    }

    /// A valid token for the owner of video `index`.
    pub fn token_for(&self, index: usize) -> String {
        self.tokenizer
            .issue(self.videos[index].user_id)
            .expect("failed to issue token")
    }
}

pub async fn send_text(client: &mut Client, text: impl Into<String>) {
    client
        .send(Message::Text(text.into()))
        .await
        .expect("failed to send frame");
}

/// Next text or binary frame, or `None` when the server closed.
pub async fn next_frame(client: &mut Client) -> Option<Frame> {
    loop {
        let message = tokio::time::timeout(FRAME_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")?
            .ok()?;
        match message {
            Message::Text(text) => return Some(Frame::Text(text)),
            Message::Binary(data) => return Some(Frame::Binary(data)),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Frames of one action: everything up to and including `stop` or `error:`.
pub async fn collect_stream(client: &mut Client) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = next_frame(client).await {
        let done = matches!(&frame, Frame::Text(t) if t == "stop" || t.starts_with("error:"));
        frames.push(frame);
        if done {
            break;
        }
    }
    frames
}

/// Concatenated payload of every binary frame.
pub fn binary_payload(frames: &[Frame]) -> Vec<u8> {
    frames
        .iter()
        .filter_map(|f| match f {
            Frame::Binary(data) => Some(data.as_slice()),
            Frame::Text(_) => None,
        })
        .flatten()
        .copied()
        .collect()
}

/// Bytes that differ between neighbouring offsets, seeded per video.
pub fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i % 251) as u8).wrapping_add(seed))
        .collect()
}

pub fn start_frame() -> Frame {
    Frame::Text(format!("start:{}:{}", AUDIO_TAG, VIDEO_TAG))
}

pub fn stop_frame() -> Frame {
    Frame::Text("stop".to_string())
}
