use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use super::PipelineEvent;

/// Envelope wrapping a pipeline event with metadata
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

/// Handle for emitting pipeline events
///
/// This is cheaply cloneable and can be shared across tasks.
#[derive(Clone)]
pub struct EventHandle {
    tx: mpsc::Sender<EventEnvelope>,
}

impl EventHandle {
    /// Create a new event handle from a channel sender
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Create a handle together with the receiving end of its channel
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }

    /// Try to emit an event without waiting
    ///
    /// Returns true if the event was sent, false if the channel is full or
    /// closed.
    pub fn try_emit(&self, event: PipelineEvent) -> bool {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Dropped pipeline event: {}", e);
                false
            }
        }
    }
}
