//! Per-connection read loop turning inbound frames into actions.

use super::action::Action;
use super::proto::Communicator;
use axum::extract::ws::{close_code, Message};
use futures::{Stream, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the action channel. The listener stops reading the socket
/// while an action is waiting, which is what throttles a chatty client.
const ACTIONS_CHANNEL_CAPACITY: usize = 1;

/// Reads a connection and publishes the decoded actions.
#[derive(Debug, Clone, Default)]
pub struct ActionsListener {
    communicator: Communicator,
}

impl ActionsListener {
    pub fn new(communicator: Communicator) -> Self {
        Self { communicator }
    }

    /// Spawn the read loop over `frames`.
    ///
    /// The returned receiver closes once the client disconnects or the socket
    /// fails; the handle completes at the same time.
    pub fn listen<S>(&self, frames: S, peer: SocketAddr) -> (mpsc::Receiver<Action>, JoinHandle<()>)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(ACTIONS_CHANNEL_CAPACITY);
        let communicator = self.communicator;
        let handle = tokio::spawn(read_loop(communicator, frames, peer, tx));
        (rx, handle)
    }
}

async fn read_loop<S>(
    communicator: Communicator,
    mut frames: S,
    peer: SocketAddr,
    tx: mpsc::Sender<Action>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    tracing::debug!(peer = %peer, "Listening for actions");

    while let Some(frame) = frames.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                match frame {
                    Some(cf) if cf.code != close_code::NORMAL && cf.code != close_code::AWAY => {
                        tracing::error!(
                            peer = %peer,
                            code = cf.code,
                            reason = %cf.reason,
                            "Connection closed abnormally"
                        );
                    }
                    _ => tracing::info!(peer = %peer, "Connection closed"),
                }
                return;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(peer = %peer, error = %e, "Failed to read from connection");
                return;
            }
        };

        let request = communicator.parse(&text);
        match Action::decode(request, peer) {
            Ok(action) => {
                tracing::debug!(peer = %peer, command = %action.command(), "Action received");
                if tx.send(action).await.is_err() {
                    tracing::debug!(peer = %peer, "Action handler went away");
                    return;
                }
            }
            Err(e) => {
                tracing::error!(peer = %peer, error = %e, "Dropping inbound frame");
            }
        }
    }

    tracing::info!(peer = %peer, "Connection ended");
}
