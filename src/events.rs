// SPDX-License-Identifier: MIT

//! Engine event notification
//!
//! Notification is fire-and-forget: a channel must never report failure back
//! into the engine that emitted the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::validation::ValidationResult;

/// Events published by the engines
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A full workflow validation finished
    WorkflowValidated {
        result: ValidationResult,
        node_count: usize,
        edge_count: usize,
        validated_at: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Channel name subscribers filter on
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::WorkflowValidated { .. } => "workflow:validated",
        }
    }
}

/// Sink for engine events
pub trait EventChannel: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Event bus using tokio broadcast channel.
/// All subscribers receive all events.
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventChannel for EventBus {
    fn emit(&self, event: EngineEvent) {
        log::debug!("Emitting {}", event.name());
        // Ignore error if no receivers
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated() -> EngineEvent {
        EngineEvent::WorkflowValidated {
            result: ValidationResult::from_issues(vec![]),
            node_count: 2,
            edge_count: 1,
            validated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit(validated());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "workflow:validated");
        match event {
            EngineEvent::WorkflowValidated {
                result, node_count, ..
            } => {
                assert!(result.valid);
                assert_eq!(node_count, 2);
            }
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit(validated());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(validated()).unwrap();
        assert_eq!(json["event"], "workflow_validated");
        assert_eq!(json["result"]["valid"], true);
        assert_eq!(json["edge_count"], 1);
    }
}
