//! Audit sink port.

use crate::domain::AuditEvent;

/// Receives audit events. Implementations must not block the caller.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Sink that drops every event.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn emit(&self, _event: AuditEvent) {}
}
