//! Post submission: validate, sanitize, persist.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AuditAction, AuditEvent, AuditOutcome, Post};
use crate::error::{GatewayError, GatewayResult};
use crate::ports::{AuditSink, BackingStore, IdentityVerifier};
use crate::validation::{sanitize_rich_text, validate_content_safety, validate_length};

use super::{Caller, call_with_timeout, resolve_identity};

pub const MAX_POST_LENGTH: usize = 5_000;

pub struct PostService {
    identity: Arc<dyn IdentityVerifier>,
    store: Arc<dyn BackingStore>,
    audit: Arc<dyn AuditSink>,
    call_timeout: Duration,
}

impl PostService {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        store: Arc<dyn BackingStore>,
        audit: Arc<dyn AuditSink>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            store,
            audit,
            call_timeout,
        }
    }

    /// Store a new post for the caller. The stored body is the sanitized
    /// form of `content`.
    pub async fn submit(&self, caller: impl Into<Caller<'_>>, content: &str) -> GatewayResult<Post> {
        let identity =
            resolve_identity(self.identity.as_ref(), caller.into(), self.call_timeout).await?;

        let mut errors = Vec::new();
        if !validate_length(content, 1, MAX_POST_LENGTH) {
            errors.push(format!(
                "Post must be between 1 and {} characters",
                MAX_POST_LENGTH
            ));
        }
        if !validate_content_safety(content) {
            errors.push("Post contains disallowed content".to_string());
        }

        let sanitized = sanitize_rich_text(content.trim());
        if errors.is_empty() && sanitized.trim().is_empty() {
            errors.push("Post must contain text".to_string());
        }

        if !errors.is_empty() {
            self.audit.emit(
                AuditEvent::new(
                    AuditAction::PostSubmit,
                    AuditOutcome::Rejected,
                    "validate",
                    errors.join("; "),
                )
                .actor(identity.user_id),
            );
            return Err(GatewayError::Validation(errors));
        }

        let post = Post::new(identity.user_id, sanitized);
        let post_id = post.id;

        let stored = call_with_timeout(self.call_timeout, self.store.insert_post(post))
            .await
            .map_err(|e| {
                tracing::error!(post_id = %post_id, error = %e, "Failed to persist post");
                GatewayError::persistence("insert_post", e)
            })?;

        self.audit.emit(
            AuditEvent::new(
                AuditAction::PostSubmit,
                AuditOutcome::Succeeded,
                "insert_post",
                "Post stored",
            )
            .actor(identity.user_id)
            .with("post_id", stored.id),
        );

        Ok(stored)
    }
}
