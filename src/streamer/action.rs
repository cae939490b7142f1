//! Client commands decoded from inbound frames.

use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use vidstream_common::VideoId;

/// Command token of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// `ID`: stream a video from the beginning.
    StreamById,
    /// `ID_WITH_OFFSET`: stream a video from a playback time.
    StreamByIdWithOffset,
    Unknown(String),
}

impl From<&str> for Command {
    fn from(token: &str) -> Self {
        match token {
            "ID" => Command::StreamById,
            "ID_WITH_OFFSET" => Command::StreamByIdWithOffset,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StreamById => f.write_str("ID"),
            Command::StreamByIdWithOffset => f.write_str("ID_WITH_OFFSET"),
            Command::Unknown(token) => f.write_str(token),
        }
    }
}

/// An inbound frame split into command and raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<'a> {
    pub command: Command,
    pub payload: &'a str,
}

/// Payload of a plain stream request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub id: VideoId,
}

/// Payload of a seek stream request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekRequest {
    #[serde(alias = "ID")]
    pub id: VideoId,

    #[serde(alias = "token", alias = "Token")]
    pub auth_token: String,

    /// Requested playback position in seconds.
    #[serde(alias = "from", alias = "From")]
    pub from_seconds: f64,

    /// Total playback length of the video in seconds.
    #[serde(alias = "duration", alias = "Duration")]
    pub total_duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionPayload {
    Stream(StreamRequest),
    SeekStream(SeekRequest),
}

impl ActionPayload {
    pub fn command(&self) -> Command {
        match self {
            ActionPayload::Stream(_) => Command::StreamById,
            ActionPayload::SeekStream(_) => Command::StreamByIdWithOffset,
        }
    }

    pub fn video_id(&self) -> VideoId {
        match self {
            ActionPayload::Stream(req) => req.id,
            ActionPayload::SeekStream(req) => req.id,
        }
    }
}

/// Why an inbound frame did not become an [`Action`].
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unsupported command: {0:?}")]
    Unsupported(String),

    #[error("malformed {command} payload: {reason}")]
    MalformedPayload { command: Command, reason: String },
}

impl ActionError {
    fn malformed(command: Command, reason: impl Into<String>) -> Self {
        ActionError::MalformedPayload {
            command,
            reason: reason.into(),
        }
    }
}

/// A decoded client command and the peer that sent it.
#[derive(Debug, Clone)]
pub struct Action {
    payload: ActionPayload,
    peer: SocketAddr,
}

impl Action {
    pub fn new(payload: ActionPayload, peer: SocketAddr) -> Self {
        Self { payload, peer }
    }

    /// Build an action from a parsed frame.
    pub fn decode(request: Request<'_>, peer: SocketAddr) -> Result<Self, ActionError> {
        let payload = match request.command {
            Command::StreamById => {
                let raw = request.payload.trim();
                if raw.is_empty() {
                    return Err(ActionError::malformed(Command::StreamById, "missing video id"));
                }
                let id = raw
                    .parse()
                    .map_err(|e| ActionError::malformed(Command::StreamById, format!("{}", e)))?;
                ActionPayload::Stream(StreamRequest { id })
            }
            Command::StreamByIdWithOffset => {
                let command = Command::StreamByIdWithOffset;
                let seek: SeekRequest = serde_json::from_str(request.payload)
                    .map_err(|e| ActionError::malformed(command.clone(), e.to_string()))?;
                validate_seconds(&command, "fromSeconds", seek.from_seconds)?;
                validate_seconds(&command, "totalDurationSeconds", seek.total_duration_seconds)?;
                ActionPayload::SeekStream(seek)
            }
            Command::Unknown(token) => return Err(ActionError::Unsupported(token)),
        };

        Ok(Self::new(payload, peer))
    }

    pub fn command(&self) -> Command {
        self.payload.command()
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    /// Remote address of the client that sent the action.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

fn validate_seconds(command: &Command, field: &str, value: f64) -> Result<(), ActionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ActionError::malformed(
            command.clone(),
            format!("{} must be a non-negative number, got {}", field, value),
        ))
    }
}
