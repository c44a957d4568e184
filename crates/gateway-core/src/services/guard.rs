//! Per-action rate limit guard consulted before any gateway action runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};
use crate::ports::{RateLimitPolicy, RateLimiter};

/// Caller-facing actions that are rate limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreatePost,
    UploadFiles,
    StartCheckout,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatePost => "create_post",
            Self::UploadFiles => "upload_files",
            Self::StartCheckout => "start_checkout",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits applied to each action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPolicies {
    pub create_post: RateLimitPolicy,
    pub upload_files: RateLimitPolicy,
    pub start_checkout: RateLimitPolicy,
}

impl Default for ActionPolicies {
    fn default() -> Self {
        Self {
            create_post: RateLimitPolicy::new(5, Duration::from_secs(60)),
            upload_files: RateLimitPolicy::new(10, Duration::from_secs(60)),
            start_checkout: RateLimitPolicy::new(3, Duration::from_secs(60)),
        }
    }
}

impl ActionPolicies {
    pub fn for_action(&self, action: ActionKind) -> RateLimitPolicy {
        match action {
            ActionKind::CreatePost => self.create_post,
            ActionKind::UploadFiles => self.upload_files,
            ActionKind::StartCheckout => self.start_checkout,
        }
    }
}

/// Owns the process's limiter handle and applies the action policies.
///
/// Constructed once at startup and shared by every handler.
#[derive(Clone)]
pub struct ActionGuard {
    limiter: Arc<dyn RateLimiter>,
    policies: ActionPolicies,
}

impl ActionGuard {
    pub fn new(limiter: Arc<dyn RateLimiter>, policies: ActionPolicies) -> Self {
        Self { limiter, policies }
    }

    pub fn policies(&self) -> &ActionPolicies {
        &self.policies
    }

    pub fn key(action: ActionKind, subject: &str) -> String {
        format!("{}:{}", action, subject)
    }

    /// Count an attempt by `subject` and reject it if over the limit.
    ///
    /// Backend failures fail open so a limiter outage does not take every
    /// action down with it.
    pub async fn enforce(&self, action: ActionKind, subject: &str) -> GatewayResult<()> {
        let key = Self::key(action, subject);
        let policy = self.policies.for_action(action);

        match self.limiter.check(&key, policy).await {
            Ok(result) if result.limited => {
                tracing::warn!(
                    action = %action,
                    subject = %subject,
                    retry_after_ms = result.reset_after.as_millis() as u64,
                    "Rate limit exceeded"
                );
                Err(GatewayError::RateLimited {
                    retry_after: result.reset_after,
                })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Rate limiter error, failing open");
                Ok(())
            }
        }
    }

    pub async fn remaining_time(&self, action: ActionKind, subject: &str) -> GatewayResult<Duration> {
        self.limiter
            .remaining_time(&Self::key(action, subject))
            .await
            .map_err(|e| GatewayError::upstream("rate_limit_remaining_time", e))
    }

    pub async fn reset(&self, action: ActionKind, subject: &str) -> GatewayResult<()> {
        self.limiter
            .reset(&Self::key(action, subject))
            .await
            .map_err(|e| GatewayError::upstream("rate_limit_reset", e))
    }
}
