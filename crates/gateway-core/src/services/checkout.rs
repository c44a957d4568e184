//! Boost checkout: price the boost, open a payment session, record it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{
    AuditAction, AuditEvent, AuditOutcome, BoostRecord, BoostTier, CheckoutRedirect,
};
use crate::error::{GatewayError, GatewayResult};
use crate::ports::{
    AuditSink, BackingStore, CheckoutMetadata, IdentityVerifier, PaymentProcessor, SessionRequest,
    StoreError,
};

use super::{CallFailure, Caller, call_with_timeout, resolve_identity};

pub const MIN_BOOST_DAYS: u32 = 1;
pub const MAX_BOOST_DAYS: u32 = 30;

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub call_timeout: Duration,
    /// Width of the time bucket folded into the idempotency key. Repeat
    /// requests inside one bucket reuse the same processor session.
    pub idempotency_bucket: Duration,
    pub currency: &'static str,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(15),
            idempotency_bucket: Duration::from_secs(600),
            currency: "usd",
        }
    }
}

/// Deterministic idempotency key for one boost purchase attempt.
pub fn idempotency_key(
    user_id: Uuid,
    target_post_id: Uuid,
    tier: BoostTier,
    duration_days: u32,
    bucket_start_secs: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b"|");
    hasher.update(target_post_id.as_bytes());
    hasher.update(b"|");
    hasher.update(tier.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(duration_days.to_be_bytes());
    hasher.update(b"|");
    hasher.update(bucket_start_secs.to_be_bytes());
    format!("{:x}", hasher.finalize())
}

fn bucket_start(now: DateTime<Utc>, bucket: Duration) -> i64 {
    let width = bucket.as_secs().max(1) as i64;
    now.timestamp().div_euclid(width) * width
}

pub struct CheckoutService {
    identity: Arc<dyn IdentityVerifier>,
    payments: Arc<dyn PaymentProcessor>,
    store: Arc<dyn BackingStore>,
    audit: Arc<dyn AuditSink>,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        payments: Arc<dyn PaymentProcessor>,
        store: Arc<dyn BackingStore>,
        audit: Arc<dyn AuditSink>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            identity,
            payments,
            store,
            audit,
            settings,
        }
    }

    /// Open a payment session for boosting `target_post_id` and record a
    /// pending boost bound to it.
    ///
    /// The tier and duration are checked before any external call. A repeat
    /// of the same request inside one idempotency bucket gets the same session
    /// back and resolves to the boost already recorded for it. A session that
    /// was created but could not be recorded is reported as `Persistence` and
    /// audited for reconciliation.
    pub async fn create_boost_checkout(
        &self,
        caller: impl Into<Caller<'_>>,
        target_post_id: Uuid,
        boost_type: &str,
        duration_days: u32,
    ) -> GatewayResult<CheckoutRedirect> {
        let timeout = self.settings.call_timeout;
        let identity = resolve_identity(self.identity.as_ref(), caller.into(), timeout).await?;

        let tier: BoostTier = boost_type.parse().inspect_err(|_| {
            self.audit.emit(
                AuditEvent::new(
                    AuditAction::BoostCheckout,
                    AuditOutcome::Rejected,
                    "parse_tier",
                    format!("Unknown boost type '{}'", boost_type),
                )
                .actor(identity.user_id),
            );
        })?;

        if !(MIN_BOOST_DAYS..=MAX_BOOST_DAYS).contains(&duration_days) {
            return Err(GatewayError::validation(format!(
                "Boost duration must be between {} and {} days",
                MIN_BOOST_DAYS, MAX_BOOST_DAYS
            )));
        }

        let amount = tier.unit_price_cents() * i64::from(duration_days);
        let request = SessionRequest {
            amount,
            currency: self.settings.currency,
            description: format!("{} boost for {} days", tier.label(), duration_days),
            metadata: CheckoutMetadata {
                target_post_id,
                user_id: identity.user_id,
                boost_type: tier,
                duration_days,
            },
            idempotency_key: idempotency_key(
                identity.user_id,
                target_post_id,
                tier,
                duration_days,
                bucket_start(Utc::now(), self.settings.idempotency_bucket),
            ),
        };

        let session = call_with_timeout(timeout, self.payments.create_session(&request))
            .await
            .map_err(|e| {
                tracing::warn!(
                    user_id = %identity.user_id,
                    post_id = %target_post_id,
                    error = %e,
                    "Checkout session creation failed"
                );
                self.audit.emit(
                    AuditEvent::new(
                        AuditAction::BoostCheckout,
                        AuditOutcome::UpstreamFailed,
                        "create_session",
                        e.to_string(),
                    )
                    .actor(identity.user_id)
                    .with("target_post_id", target_post_id),
                );
                GatewayError::upstream("create_session", e)
            })?;

        let record = BoostRecord::pending(
            identity.user_id,
            target_post_id,
            tier,
            duration_days,
            session.session_id.clone(),
        );

        let stored = match call_with_timeout(timeout, self.store.insert_boost(record)).await {
            Ok(stored) => stored,
            Err(CallFailure::Failed(StoreError::Constraint(detail))) => {
                // A repeat click reuses the session, which is already bound to a boost.
                if let Some(existing) = self.recorded_boost(&session.session_id, identity.user_id).await {
                    tracing::info!(
                        user_id = %identity.user_id,
                        boost_id = %existing.id,
                        session_id = %session.session_id,
                        "Repeat checkout resolved to recorded boost"
                    );
                    return Ok(CheckoutRedirect {
                        redirect_url: session.redirect_url,
                        boost_id: existing.id,
                    });
                }
                return Err(self.unrecorded_session(
                    identity.user_id,
                    target_post_id,
                    &session.session_id,
                    amount,
                    detail,
                ));
            }
            Err(e) => {
                return Err(self.unrecorded_session(
                    identity.user_id,
                    target_post_id,
                    &session.session_id,
                    amount,
                    e.to_string(),
                ));
            }
        };

        self.audit.emit(
            AuditEvent::new(
                AuditAction::BoostCheckout,
                AuditOutcome::Succeeded,
                "insert_boost",
                "Boost checkout started",
            )
            .actor(identity.user_id)
            .with("boost_id", stored.id)
            .with("session_id", &session.session_id),
        );

        Ok(CheckoutRedirect {
            redirect_url: session.redirect_url,
            boost_id: stored.id,
        })
    }

    /// The boost already recorded for `session_id` on behalf of `user_id`.
    async fn recorded_boost(&self, session_id: &str, user_id: Uuid) -> Option<BoostRecord> {
        match call_with_timeout(self.settings.call_timeout, self.store.find_boost_by_session(session_id)).await {
            Ok(found) => found.filter(|b| b.user_id == user_id),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Recorded boost lookup failed");
                None
            }
        }
    }

    /// A live session with no matching boost row.
    fn unrecorded_session(
        &self,
        user_id: Uuid,
        target_post_id: Uuid,
        session_id: &str,
        amount: i64,
        detail: String,
    ) -> GatewayError {
        tracing::error!(
            user_id = %user_id,
            session_id,
            error = %detail,
            "Checkout session created but boost not recorded"
        );
        self.audit.emit(
            AuditEvent::new(
                AuditAction::BoostCheckout,
                AuditOutcome::NeedsReconciliation,
                "insert_boost",
                detail.clone(),
            )
            .actor(user_id)
            .with("session_id", session_id)
            .with("target_post_id", target_post_id)
            .with("amount", amount),
        );
        GatewayError::persistence("insert_boost", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoostStatus;
    use crate::services::testing::{
        RecordingAudit, RecordingPayments, RecordingStore, StaticIdentity, VALID_TOKEN,
    };

    struct Fixture {
        identity: Arc<StaticIdentity>,
        payments: Arc<RecordingPayments>,
        store: Arc<RecordingStore>,
        audit: Arc<RecordingAudit>,
        service: CheckoutService,
    }

    fn fixture(payments: RecordingPayments, store: RecordingStore) -> Fixture {
        let identity = Arc::new(StaticIdentity::new());
        let payments = Arc::new(payments);
        let store = Arc::new(store);
        let audit = Arc::new(RecordingAudit::default());
        let service = CheckoutService::new(
            identity.clone(),
            payments.clone(),
            store.clone(),
            audit.clone(),
            CheckoutSettings::default(),
        );
        Fixture {
            identity,
            payments,
            store,
            audit,
            service,
        }
    }

    #[tokio::test]
    async fn test_checkout_records_pending_boost() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());
        let post_id = Uuid::new_v4();

        let redirect = f
            .service
            .create_boost_checkout(VALID_TOKEN, post_id, "featured", 7)
            .await
            .unwrap();

        assert_eq!(redirect.redirect_url, "https://pay.test/c/cs_test_0");

        let boosts = f.store.boosts.lock().unwrap();
        assert_eq!(boosts.len(), 1);
        let boost = &boosts[0];
        assert_eq!(boost.id, redirect.boost_id);
        assert_eq!(boost.status, BoostStatus::Pending);
        assert_eq!(boost.amount, 3_500);
        assert_eq!(boost.external_session_id, "cs_test_0");
        assert_eq!(boost.user_id, f.identity.user_id());
        assert_eq!(boost.target_post_id, post_id);

        let request = f.payments.last_request().unwrap();
        assert_eq!(request.amount, 3_500);
        assert_eq!(request.currency, "usd");
        assert_eq!(request.description, "Featured boost for 7 days");
        assert_eq!(request.metadata.boost_type, BoostTier::Featured);
        assert_eq!(request.metadata.duration_days, 7);
        assert_eq!(request.idempotency_key.len(), 64);
    }

    #[tokio::test]
    async fn test_unknown_tier_makes_no_external_calls() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());

        let err = f
            .service
            .create_boost_checkout(VALID_TOKEN, Uuid::new_v4(), "gold", 7)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidTier(ref t) if t == "gold"));
        assert_eq!(f.payments.call_count(), 0);
        assert_eq!(f.store.insert_count(), 0);
    }

    #[tokio::test]
    async fn test_duration_out_of_range_is_validation_error() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());

        for days in [0, 31] {
            let err = f
                .service
                .create_boost_checkout(VALID_TOKEN, Uuid::new_v4(), "premium", days)
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
        assert_eq!(f.payments.call_count(), 0);
    }

    #[tokio::test]
    async fn test_processor_failure_is_upstream_and_persists_nothing() {
        let f = fixture(
            RecordingPayments {
                fail: true,
                ..RecordingPayments::default()
            },
            RecordingStore::default(),
        );

        let err = f
            .service
            .create_boost_checkout(VALID_TOKEN, Uuid::new_v4(), "priority", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Upstream { step: "create_session", .. }));
        assert!(!err.public_message().contains("sk_test"));
        assert_eq!(f.store.insert_count(), 0);
        assert_eq!(f.audit.events()[0].outcome, AuditOutcome::UpstreamFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_timeout_is_upstream() {
        let f = fixture(
            RecordingPayments {
                delay: Some(Duration::from_secs(60)),
                ..RecordingPayments::default()
            },
            RecordingStore::default(),
        );

        let err = f
            .service
            .create_boost_checkout(VALID_TOKEN, Uuid::new_v4(), "priority", 3)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Upstream { .. }));
        assert_eq!(f.store.insert_count(), 0);
    }

    #[tokio::test]
    async fn test_unrecorded_session_needs_reconciliation() {
        let f = fixture(
            RecordingPayments::default(),
            RecordingStore {
                fail_boost_inserts: true,
                ..RecordingStore::default()
            },
        );

        let err = f
            .service
            .create_boost_checkout(VALID_TOKEN, Uuid::new_v4(), "featured", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Persistence { step: "insert_boost", .. }));
        let events = f.audit.events();
        let event = events
            .iter()
            .find(|e| e.outcome == AuditOutcome::NeedsReconciliation)
            .expect("reconciliation event");
        assert_eq!(event.context_value("session_id"), Some("cs_test_0"));
    }

    #[tokio::test]
    async fn test_repeat_checkout_returns_recorded_boost() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());
        let post_id = Uuid::new_v4();

        let first = f
            .service
            .create_boost_checkout(VALID_TOKEN, post_id, "priority", 3)
            .await
            .unwrap();
        let second = f
            .service
            .create_boost_checkout(VALID_TOKEN, post_id, "priority", 3)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(f.payments.call_count(), 2);
        assert_eq!(f.store.boosts.lock().unwrap().len(), 1);
        assert!(
            f.audit
                .events()
                .iter()
                .all(|e| e.outcome != AuditOutcome::NeedsReconciliation)
        );
    }

    #[tokio::test]
    async fn test_changed_duration_opens_new_session() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());
        let post_id = Uuid::new_v4();

        let three = f
            .service
            .create_boost_checkout(VALID_TOKEN, post_id, "priority", 3)
            .await
            .unwrap();
        let five = f
            .service
            .create_boost_checkout(VALID_TOKEN, post_id, "priority", 5)
            .await
            .unwrap();

        assert_ne!(three.boost_id, five.boost_id);
        assert_ne!(three.redirect_url, five.redirect_url);
        let boosts = f.store.boosts.lock().unwrap();
        assert_eq!(boosts.len(), 2);
        assert_eq!(boosts[1].amount, 5_000);
    }

    #[tokio::test]
    async fn test_unauthorized_makes_no_external_calls() {
        let f = fixture(RecordingPayments::default(), RecordingStore::default());

        let err = f
            .service
            .create_boost_checkout("", Uuid::new_v4(), "featured", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Unauthorized));
        assert_eq!(f.payments.call_count(), 0);
    }

    #[test]
    fn test_idempotency_key_is_deterministic_within_bucket() {
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();
        let bucket = Duration::from_secs(600);
        let t0 = DateTime::from_timestamp(1_700_000_400, 0).unwrap();
        let t1 = DateTime::from_timestamp(1_700_000_999, 0).unwrap();
        let t2 = DateTime::from_timestamp(1_700_001_000, 0).unwrap();

        let key = |tier, days, at| idempotency_key(user, post, tier, days, bucket_start(at, bucket));

        let k0 = key(BoostTier::Featured, 7, t0);
        let k1 = key(BoostTier::Featured, 7, t1);
        let k2 = key(BoostTier::Featured, 7, t2);
        let other_tier = key(BoostTier::Premium, 7, t0);
        let other_duration = key(BoostTier::Featured, 8, t0);

        assert_eq!(k0, k1);
        assert_ne!(k0, k2);
        assert_ne!(k0, other_tier);
        assert_ne!(k0, other_duration);
    }
}
