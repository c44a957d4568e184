//! Rate limiting port.

use std::time::Duration;

use async_trait::async_trait;

/// How many attempts a key gets per fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }
}

/// Rate limiter trait - abstraction over rate limiting backends.
///
/// Implementations count attempts in fixed windows: every attempt for a key
/// resets together at the end of its window, so up to twice `max_attempts`
/// can land around a window boundary. A window ends at `start + window`
/// inclusive: an attempt made exactly at that instant opens a new window.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record an attempt for `key`. The read-modify-write is atomic per key.
    async fn check(&self, key: &str, policy: RateLimitPolicy)
    -> Result<RateLimitResult, RateLimitError>;

    /// Time until the current window for `key` ends; zero if none is open.
    async fn remaining_time(&self, key: &str) -> Result<Duration, RateLimitError>;

    /// Forget `key`, immediately lifting any limit on it.
    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub limited: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
