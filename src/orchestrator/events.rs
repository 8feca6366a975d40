//! Engine Event Bus
//!
//! Broadcasts request lifecycle and per-classifier latency to whoever is
//! listening (a debug console, a metrics sink). Publishing never blocks and
//! is a no-op without subscribers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::field::Strategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    RequestStarted { request_id: Uuid, field: String },
    ClassifierFinished { request_id: Uuid, classifier: String, strategy: Strategy, latency_ms: f64 },
    ClassifierFailed { request_id: Uuid, classifier: String, error: String },
    RequestCompleted { request_id: Uuid, strategy: Strategy },
    RequestFailed { request_id: Uuid, reason: String },
}

impl EngineEvent {
    pub fn request_id(&self) -> Uuid {
        match self {
            EngineEvent::RequestStarted { request_id, .. }
            | EngineEvent::ClassifierFinished { request_id, .. }
            | EngineEvent::ClassifierFailed { request_id, .. }
            | EngineEvent::RequestCompleted { request_id, .. }
            | EngineEvent::RequestFailed { request_id, .. } => *request_id,
        }
    }
}

pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static::lazy_static! {
    /// Process-wide bus used when an orchestrator is not given its own.
    pub static ref ENGINE_EVENT_BUS: Arc<EventBus> = Arc::new(EventBus::new());
}
