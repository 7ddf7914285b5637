use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub seq: i64,
    pub category: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: String,
}

pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
    seq: AtomicI64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            seq: AtomicI64::new(0),
        }
    }

    pub fn publish(&self, event: GameEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("game event dropped: no subscribers");
        }
    }

    /// Build and publish an event in one call.
    pub fn emit(
        &self,
        category: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> GameEvent {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = GameEvent {
            id: Uuid::new_v4().to_string(),
            seq,
            category: category.into(),
            event_type: event_type.into(),
            payload,
            created_at: Utc::now().to_rfc3339(),
        };
        self.publish(event.clone());
        event
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }
}
