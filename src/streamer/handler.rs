//! Per-connection dispatch of actions to strategies.

use super::action::Action;
use super::proto::Connection;
use super::strategy::ActionStrategy;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runs each action through the first strategy that accepts it.
///
/// Actions of one connection are served one at a time, in arrival order.
#[derive(Clone)]
pub struct ActionsHandler {
    strategies: Arc<[Arc<dyn ActionStrategy>]>,
}

impl ActionsHandler {
    /// Strategies are tried in the given order.
    pub fn new(strategies: Vec<Arc<dyn ActionStrategy>>) -> Self {
        Self {
            strategies: strategies.into(),
        }
    }

    /// Serve actions until the channel closes, writing replies to `conn`.
    pub fn handle(
        &self,
        mut actions: mpsc::Receiver<Action>,
        mut conn: Connection,
    ) -> JoinHandle<()> {
        let handler = self.clone();
        tokio::spawn(async move {
            while let Some(action) = actions.recv().await {
                handler.dispatch(&action, &mut conn).await;
            }
        })
    }

    pub async fn dispatch(&self, action: &Action, conn: &mut Connection) {
        let peer = action.peer();

        let Some(strategy) = self.strategies.iter().find(|s| s.is_appropriate(action)) else {
            tracing::warn!(peer = %peer, command = %action.command(), "No strategy for action");
            return;
        };

        tracing::debug!(peer = %peer, strategy = strategy.name(), "Executing strategy");
        if let Err(e) = strategy.execute(action, conn).await {
            tracing::error!(
                peer = %peer,
                strategy = strategy.name(),
                error = %e,
                "Strategy failed"
            );
        }
    }
}
