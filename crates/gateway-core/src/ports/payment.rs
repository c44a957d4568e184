//! Payment processor port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::BoostTier;

/// Metadata attached to a checkout session so that reconciliation can
/// match a completed payment back to its boost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub target_post_id: Uuid,
    pub user_id: Uuid,
    pub boost_type: BoostTier,
    pub duration_days: u32,
}

/// Request to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Total in the smallest currency unit.
    pub amount: i64,
    pub currency: &'static str,
    pub description: String,
    pub metadata: CheckoutMetadata,
    /// Identical keys must yield the same session.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, PaymentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Processor declined the request: {0}")]
    Declined(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),
}
