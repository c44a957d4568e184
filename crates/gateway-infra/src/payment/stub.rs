//! Local payment processor that never charges anyone.

use async_trait::async_trait;
use dashmap::DashMap;

use gateway_core::ports::{CheckoutSession, PaymentError, PaymentProcessor, SessionRequest};

/// Fallback when no processor is configured. Sessions are fake; repeating an
/// idempotency key returns the same session, as a real processor would.
pub struct StubPaymentProcessor {
    sessions: DashMap<String, CheckoutSession>,
    redirect_base: String,
}

impl StubPaymentProcessor {
    pub fn new(redirect_base: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            redirect_base: redirect_base.into(),
        }
    }
}

impl Default for StubPaymentProcessor {
    fn default() -> Self {
        Self::new("http://localhost:3000/checkout/stub")
    }
}

#[async_trait]
impl PaymentProcessor for StubPaymentProcessor {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        let session = self
            .sessions
            .entry(request.idempotency_key.clone())
            .or_insert_with(|| {
                let id = format!("cs_stub_{}", uuid::Uuid::new_v4().simple());
                tracing::warn!(session_id = %id, amount = request.amount, "Stub checkout session created");
                CheckoutSession {
                    redirect_url: format!("{}/{}", self.redirect_base.trim_end_matches('/'), id),
                    session_id: id,
                }
            })
            .clone();
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use gateway_core::domain::BoostTier;
    use gateway_core::ports::CheckoutMetadata;
    use uuid::Uuid;

    use super::*;

    fn request(key: &str) -> SessionRequest {
        SessionRequest {
            amount: 500,
            currency: "usd",
            description: "Featured boost for 1 days".to_string(),
            metadata: CheckoutMetadata {
                target_post_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                boost_type: BoostTier::Featured,
                duration_days: 1,
            },
            idempotency_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_same_key_same_session() {
        let processor = StubPaymentProcessor::default();

        let a = processor.create_session(&request("k1")).await.unwrap();
        let b = processor.create_session(&request("k1")).await.unwrap();
        let c = processor.create_session(&request("k2")).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a.session_id, c.session_id);
        assert!(a.redirect_url.ends_with(&a.session_id));
    }
}
