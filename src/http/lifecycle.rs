//! Server lifecycle phases.
//!
//! `NotStarted -> Provisioning -> Listening -> ShuttingDown -> Stopped`.
//! Transitions only move forward one step at a time; there is no restart in
//! place. The current phase is published on a `watch` channel.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerPhase {
    NotStarted,
    Provisioning,
    Listening,
    ShuttingDown,
    Stopped,
}

impl ServerPhase {
    /// The only phase this one may advance to.
    pub fn next(self) -> Option<ServerPhase> {
        match self {
            ServerPhase::NotStarted => Some(ServerPhase::Provisioning),
            ServerPhase::Provisioning => Some(ServerPhase::Listening),
            ServerPhase::Listening => Some(ServerPhase::ShuttingDown),
            ServerPhase::ShuttingDown => Some(ServerPhase::Stopped),
            ServerPhase::Stopped => None,
        }
    }
}

impl fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerPhase::NotStarted => "not_started",
            ServerPhase::Provisioning => "provisioning",
            ServerPhase::Listening => "listening",
            ServerPhase::ShuttingDown => "shutting_down",
            ServerPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid lifecycle transition from {from} to {to}")]
pub struct LifecycleError {
    pub from: ServerPhase,
    pub to: ServerPhase,
}

/// Shared handle to the server phase.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<ServerPhase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServerPhase::NotStarted);
        Self { tx: Arc::new(tx) }
    }

    pub fn phase(&self) -> ServerPhase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerPhase> {
        self.tx.subscribe()
    }

    /// Move to `to`, which must be the successor of the current phase.
    pub fn advance(&self, to: ServerPhase) -> Result<(), LifecycleError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|current| {
            if current.next() == Some(to) {
                tracing::debug!(from = %current, %to, "Server phase changed");
                *current = to;
                true
            } else {
                result = Err(LifecycleError { from: *current, to });
                false
            }
        });
        result
    }
}
