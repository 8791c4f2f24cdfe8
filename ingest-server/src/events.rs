//! In-process event bus
//!
//! Handlers publish after data changes; `/api/events` relays every event to
//! its subscribers as server-sent events. Slow subscribers drop old events.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

pub const RECORDS_UPDATED: &str = "records_updated";
pub const MODEL_UPDATED: &str = "model_updated";
pub const MODEL_DELETED: &str = "model_deleted";
pub const ANALYSIS_COMPLETED: &str = "analysis_completed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusEvent {
    pub event: String,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Fire and forget; no subscribers is not an error
    pub fn publish(&self, event: &str, data: Value) {
        let delivered = self
            .sender
            .send(BusEvent { event: event.to_string(), data })
            .unwrap_or(0);
        tracing::debug!("Published '{}' to {} subscriber(s)", event, delivered);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
