//! Background polling of a query
//!
//! Periodically force-refetches a `Query` on a tokio interval and reports each
//! outcome over a channel, so a front end can react without awaiting loads.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::query::{Query, QueryState};

/// Messages sent from the background poller
#[derive(Debug, Clone, PartialEq)]
pub enum PollMessage {
    /// The query reloaded successfully
    Updated(QueryState),
    /// The reload failed; carries the error message
    RefreshError(String),
}

/// Configuration for polling
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between forced reloads
    pub interval: Duration,
    /// Whether polling is enabled
    pub enabled: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            enabled: true,
        }
    }
}

/// Handle for controlling a background poller
pub struct Poller {
    /// Channel for receiving poll results
    pub receiver: mpsc::Receiver<PollMessage>,
    /// Signals the polling task to stop
    shutdown_tx: mpsc::Sender<()>,
}

impl Poller {
    /// Spawns the polling task for `query`
    ///
    /// The first reload happens one `interval` after spawning. With polling
    /// disabled no task is spawned and the receiver never yields.
    pub fn spawn(query: Arc<Query>, config: PollConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let state = query.refresh().await;
                            let message = match &state.error {
                                Some(error) => PollMessage::RefreshError(error.clone()),
                                None => PollMessage::Updated(state),
                            };
                            if msg_tx.send(message).await.is_err() {
                                // Receiver dropped
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next poll result
    pub async fn recv(&mut self) -> Option<PollMessage> {
        self.receiver.recv().await
    }

    /// Stops the polling task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for a pending poll result without blocking
pub fn try_recv(poller: &mut Poller) -> Option<PollMessage> {
    poller.receiver.try_recv().ok()
}
