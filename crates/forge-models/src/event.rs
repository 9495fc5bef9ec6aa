//! `Event` — one append-only Event Log record (spec.md §4.2, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// A single record. `event_type` is a dotted identifier (`job.started`,
/// `step.succeeded`, `llm.request`, ...) rather than an enum: the Event Log
/// is append-only and forward-compatible, so new event types must not
/// require a schema change here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub level: EventLevel,
    pub job_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Implemented by whichever durable `events.jsonl` writer a caller wires in
/// (`forge-runs::JsonlEventLog` for a real run). A sink is best-effort, like
/// `forge_core::cache::NodeCache`: a failure to persist one event is the
/// sink's concern to log, not the caller's to propagate.
pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
}

impl Event {
    pub fn new(job_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level: EventLevel::Info,
            job_id: job_id.into(),
            event_type: event_type.into(),
            step: None,
            data: Value::Null,
        }
    }

    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}
