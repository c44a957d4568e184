//! Audit sink that writes events to the `audit` tracing target.

use gateway_core::domain::{AuditEvent, AuditOutcome};
use gateway_core::ports::AuditSink;

/// Renders audit events as structured log lines.
///
/// `NeedsReconciliation` events are logged at ERROR so the alert layer
/// picks them up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    fn context_json(event: &AuditEvent) -> String {
        let map: serde_json::Map<String, serde_json::Value> = event
            .context
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let context = Self::context_json(&event);
        let actor = event.actor.map(|a| a.to_string()).unwrap_or_default();
        let action = format!("{:?}", event.action);
        let outcome = format!("{:?}", event.outcome);

        match event.outcome {
            AuditOutcome::NeedsReconciliation => tracing::error!(
                target: "audit",
                action = %action,
                outcome = %outcome,
                actor = %actor,
                step = event.step,
                context = %context,
                "{}",
                event.message
            ),
            AuditOutcome::UpstreamFailed => tracing::warn!(
                target: "audit",
                action = %action,
                outcome = %outcome,
                actor = %actor,
                step = event.step,
                context = %context,
                "{}",
                event.message
            ),
            AuditOutcome::Succeeded | AuditOutcome::Rejected => tracing::info!(
                target: "audit",
                action = %action,
                outcome = %outcome,
                actor = %actor,
                step = event.step,
                context = %context,
                "{}",
                event.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use gateway_core::domain::AuditAction;

    use super::*;

    #[test]
    fn test_context_rendered_as_json_object() {
        let event = AuditEvent::new(
            AuditAction::BoostCheckout,
            AuditOutcome::NeedsReconciliation,
            "insert_boost",
            "deadlock",
        )
        .with("session_id", "cs_1")
        .with("amount", 500);

        let json: serde_json::Value =
            serde_json::from_str(&TracingAuditSink::context_json(&event)).unwrap();

        assert_eq!(json["session_id"], "cs_1");
        assert_eq!(json["amount"], "500");
    }

    #[test]
    fn test_emit_does_not_panic_without_subscriber() {
        TracingAuditSink.emit(AuditEvent::new(
            AuditAction::PostSubmit,
            AuditOutcome::Succeeded,
            "insert_post",
            "ok",
        ));
    }
}
