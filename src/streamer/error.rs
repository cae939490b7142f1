use super::action::Command;
use super::proto::ProtoError;
use crate::detector::DetectError;
use crate::tokenizer::TokenError;
use std::path::PathBuf;
use vidstream_common::VideoId;

/// Reasons a strategy ends a stream early.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Also the text of the `error` frame sent to the client.
    #[error("video {0} not found")]
    NotFound(VideoId),

    #[error("video lookup failed: {0}")]
    Repository(vidstream_common::Error),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error("codec detection failed: {0}")]
    Detect(#[from] DetectError),

    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("strategy cannot handle {0} actions")]
    UnexpectedAction(Command),
}
