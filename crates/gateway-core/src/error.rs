//! Gateway error taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Result type returned by every orchestration step.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures surfaced by the gateway to its callers.
///
/// `Upstream` and `Persistence` carry operator-facing detail. Callers that
/// render errors for end users must use [`GatewayError::public_message`]
/// instead of `Display`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Rate limited, retry after {}ms", .retry_after.as_millis())]
    RateLimited { retry_after: Duration },

    #[error("Invalid boost tier: {0}")]
    InvalidTier(String),

    #[error("File limit exceeded: {attempted} new + {existing} existing > {max}")]
    FileLimitExceeded {
        attempted: usize,
        existing: u64,
        max: usize,
    },

    #[error("Upstream failure during {step}: {detail}")]
    Upstream { step: &'static str, detail: String },

    #[error("Persistence failure during {step}: {detail}")]
    Persistence { step: &'static str, detail: String },
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn upstream(step: &'static str, detail: impl ToString) -> Self {
        Self::Upstream {
            step,
            detail: detail.to_string(),
        }
    }

    pub fn persistence(step: &'static str, detail: impl ToString) -> Self {
        Self::Persistence {
            step,
            detail: detail.to_string(),
        }
    }

    /// Stable machine-readable classification.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Validation(_) => "validation_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidTier(_) => "invalid_tier",
            Self::FileLimitExceeded { .. } => "file_limit_exceeded",
            Self::Upstream { .. } => "upstream_error",
            Self::Persistence { .. } => "persistence_error",
        }
    }

    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Upstream { .. } | Self::Persistence { .. }
        )
    }

    /// Message safe to show to end users. Never includes upstream error text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized => "Authentication required".to_string(),
            Self::Validation(errors) => errors.join(", "),
            Self::RateLimited { retry_after } => format!(
                "Too many attempts. Try again in {} seconds.",
                retry_after.as_secs().max(1)
            ),
            Self::InvalidTier(tier) => format!("Unknown boost tier '{}'", tier),
            Self::FileLimitExceeded { max, .. } => {
                format!("You can upload at most {} files", max)
            }
            Self::Upstream { .. } => "An external service failed. Please try again.".to_string(),
            Self::Persistence { .. } => "Your request could not be saved.".to_string(),
        }
    }
}
