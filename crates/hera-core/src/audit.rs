//! Structured audit events.
//!
//! The audit stream is fire-and-forget and non-authoritative: the persisted
//! session state is the durable record, the audit stream exists for
//! observability. Sinks must never fail a turn.

use chrono::Utc;
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::Mutex;
use tracing::info;

/// A single audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Stable event type, e.g. `authorization_deny`
    pub event_type: String,
    /// Session the event belongs to, if any
    pub session_id: Option<String>,
    /// Free-form structured details
    pub details: Value,
}

/// Sink for audit events.
pub trait AuditSink: Send + Sync {
    /// Record one event. Must not fail and must not block the turn.
    fn log_event(&self, event_type: &str, session_id: Option<&str>, details: Value);

    /// Record a completed execution.
    fn log_execution(&self, session_id: Option<&str>, action: &str, args: Value) {
        self.log_event(
            "execution",
            session_id,
            json!({ "action": action, "args": args }),
        );
    }

    /// Record an unexpected failure with its root cause.
    fn log_error(&self, session_id: Option<&str>, error: &dyn Display) {
        self.log_event(
            "error",
            session_id,
            json!({ "error": error.to_string() }),
        );
    }
}

/// Audit sink that emits one JSON line per event via `tracing`.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Create a new tracing-backed sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    fn log_event(&self, event_type: &str, session_id: Option<&str>, details: Value) {
        let payload = json!({
            "event_type": event_type,
            "session_id": session_id,
            "timestamp": Utc::now().to_rfc3339(),
            "details": details,
        });
        info!(target: "hera::audit", event = %payload);
    }
}

/// In-memory sink that records events for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit lock poisoned").clone()
    }

    /// Whether any event of the given type was recorded.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.events().iter().any(|e| e.event_type == event_type)
    }
}

impl AuditSink for RecordingAuditSink {
    fn log_event(&self, event_type: &str, session_id: Option<&str>, details: Value) {
        self.events.lock().expect("audit lock poisoned").push(AuditEvent {
            event_type: event_type.to_string(),
            session_id: session_id.map(str::to_string),
            details,
        });
    }
}
