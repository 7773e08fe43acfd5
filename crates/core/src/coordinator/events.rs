//! Run completion broadcast.
//!
//! An explicit publish/subscribe handle passed to the components that need
//! it; there is no ambient event bus. Every terminal transition publishes
//! exactly one event.

use tokio::sync::broadcast;
use tracing::debug;

use crate::api::RunId;

/// Terminal-transition notification for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The run completed and its results are available.
    Completed { run_id: RunId },
    /// The run failed; its tickets returned to the ready pool.
    Failed { run_id: RunId, error: String },
}

impl RunEvent {
    /// Run this event refers to.
    pub fn run_id(&self) -> RunId {
        match self {
            RunEvent::Completed { run_id } => *run_id,
            RunEvent::Failed { run_id, .. } => *run_id,
        }
    }
}

/// Cloneable handle over the run event channel.
#[derive(Debug, Clone)]
pub struct RunEvents {
    tx: broadcast::Sender<RunEvent>,
}

impl RunEvents {
    /// Create a channel with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to run events. Each subscriber sees every event published
    /// after the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub fn publish(&self, event: RunEvent) {
        debug!(run_id = event.run_id(), "Publishing run event");
        let _ = self.tx.send(event);
    }
}
