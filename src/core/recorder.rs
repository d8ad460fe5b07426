//! Activity recorder implementations.
//!
//! The recorder is a best-effort event sink: the controller reports every
//! settled operation to it, catches any failure, and never lets recording
//! affect the outcome of an admission operation.

use std::collections::VecDeque;

use crate::core::error::AdmissionError;
use crate::util::clock::now_ms;
use crate::util::serde::{RequestId, ResourceId};

/// Activity event structure.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related request identifier.
    pub request_id: RequestId,
    /// Resource the event concerns.
    pub resource: ResourceId,
    /// Acting identity: a reviewer id, the requester id, or `system`.
    pub actor: String,
    /// Action taken (submit, waitlist, approve, reject, promote).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub details: Option<String>,
}

/// Best-effort activity sink abstraction.
///
/// Implementations are injected into the controller and lifecycle-managed by
/// the caller; there is no process-global instance.
pub trait ActivityRecorder: Send {
    /// Record an activity event. Errors are logged and swallowed by the
    /// controller, never propagated to the triggering operation.
    fn record(&mut self, event: ActivityEvent) -> Result<(), AdmissionError>;
}

/// In-memory activity recorder for testing and dev. Keeps a bounded ring of
/// the most recent events.
pub struct InMemoryActivityRecorder {
    events: VecDeque<ActivityEvent>,
    max_events: usize,
}

impl InMemoryActivityRecorder {
    /// Create a new in-memory recorder with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.iter().cloned().collect()
    }
}

impl ActivityRecorder for InMemoryActivityRecorder {
    fn record(&mut self, event: ActivityEvent) -> Result<(), AdmissionError> {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
        Ok(())
    }
}

/// Postgres-backed activity recorder (schema-only; DB I/O not wired).
pub struct PostgresActivityRecorder;

impl PostgresActivityRecorder {
    /// Returns SQL migration statements for the activity log.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS sk_activity_events (
    event_id TEXT PRIMARY KEY,
    request_id UUID NOT NULL,
    resource_id UUID NOT NULL,
    actor TEXT NOT NULL,
    action TEXT NOT NULL,
    details TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_sk_activity_events_resource_created ON sk_activity_events (resource_id, created_at);
CREATE INDEX IF NOT EXISTS idx_sk_activity_events_request ON sk_activity_events (request_id);
"#,
        ]
    }
}

impl ActivityRecorder for PostgresActivityRecorder {
    fn record(&mut self, _event: ActivityEvent) -> Result<(), AdmissionError> {
        // Stub: actual DB writes require a runtime + client; left to the
        // integration layer.
        Ok(())
    }
}

/// Helper to build an activity event from context.
pub fn build_activity_event(
    request_id: RequestId,
    resource: ResourceId,
    actor: impl Into<String>,
    action: impl Into<String>,
    details: Option<String>,
) -> ActivityEvent {
    let action = action.into();
    ActivityEvent {
        event_id: format!("{request_id}-{action}-{}", now_ms()),
        request_id,
        resource,
        actor: actor.into(),
        action,
        created_at_ms: now_ms(),
        details,
    }
}
