//! The event sink contract: `append(org_id, run_id, kind, payload)`. The
//! core emits exactly `node_event` kinds during a run.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub org_id: String,
    pub run_id: Uuid,
    pub kind: String,
    pub payload: Value,
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn append(&self, org_id: &str, run_id: Uuid, kind: &str, payload: Value);
}

/// Append-only in-process sink, used by tests and the CLI demo to inspect
/// the full event stream a run produced.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<EventRecord>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().expect("event sink mutex poisoned").clone()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn append(&self, org_id: &str, run_id: Uuid, kind: &str, payload: Value) {
        self.events.lock().expect("event sink mutex poisoned").push(EventRecord {
            org_id: org_id.to_string(),
            run_id,
            kind: kind.to_string(),
            payload,
        });
    }
}

/// Forwards every event to `tracing` instead of buffering it, for the CLI
/// demo runner where a live log stream is preferred over inspection.
#[derive(Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn append(&self, org_id: &str, run_id: Uuid, kind: &str, payload: Value) {
        tracing::info!(org_id, %run_id, kind, %payload, "event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_are_recorded_in_append_order() {
        let sink = InMemoryEventSink::new();
        let run_id = Uuid::new_v4();
        sink.append("org", run_id, "node_event", serde_json::json!({"node": "intent"})).await;
        sink.append("org", run_id, "node_event", serde_json::json!({"node": "planner"})).await;
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload["node"], "intent");
        assert_eq!(events[1].payload["node"], "planner");
    }
}
