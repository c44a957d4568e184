use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which gateway action produced an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PostSubmit,
    FileUpload,
    BoostCheckout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Succeeded,
    Rejected,
    UpstreamFailed,
    /// External side effect happened but the local record was not written.
    /// These events drive reconciliation.
    NeedsReconciliation,
}

/// A structured record of something the gateway did or refused to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub occurred_at: DateTime<Utc>,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub actor: Option<Uuid>,
    pub step: &'static str,
    pub message: String,
    /// Identifiers an operator needs to follow up (external keys, session ids).
    pub context: Vec<(&'static str, String)>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        outcome: AuditOutcome,
        step: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            occurred_at: Utc::now(),
            action,
            outcome,
            actor: None,
            step,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn actor(mut self, user_id: Uuid) -> Self {
        self.actor = Some(user_id);
        self
    }

    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}
