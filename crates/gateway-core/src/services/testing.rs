//! Test doubles for the collaborator ports, with call counting.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuditEvent, BoostRecord, Identity, Post, UploadedFileRecord};
use crate::ports::{
    AuditSink, BackingStore, BlobMetadata, BlobStore, BlobStoreError, CheckoutSession,
    IdentityError, IdentityVerifier, PaymentError, PaymentProcessor, RateLimitError,
    RateLimitPolicy, RateLimitResult, RateLimiter, SessionRequest, StoreError, StoredBlob,
};

pub const VALID_TOKEN: &str = "valid-token";
pub const PROVIDER_DOWN_TOKEN: &str = "provider-down";

pub struct StaticIdentity {
    pub identity: Identity,
    pub calls: AtomicUsize,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self {
            identity: Identity {
                user_id: Uuid::new_v4(),
                email: "user@example.com".to_string(),
                roles: vec!["user".to_string()],
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.user_id
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match token {
            VALID_TOKEN => Ok(self.identity.clone()),
            PROVIDER_DOWN_TOKEN => Err(IdentityError::Unavailable("503".to_string())),
            other => Err(IdentityError::InvalidToken(other.to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingBlobStore {
    pub calls: AtomicUsize,
    pub failing_names: HashSet<String>,
    pub delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RecordingBlobStore {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            failing_names: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn put(&self, _bytes: Vec<u8>, metadata: &BlobMetadata) -> Result<StoredBlob, BlobStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_names.contains(&metadata.file_name) {
            return Err(BlobStoreError::Rejected("quota exceeded".to_string()));
        }

        let key = format!("{}/{}", metadata.owner_id, metadata.file_name);
        Ok(StoredBlob {
            url: format!("https://cdn.test/{}", key),
            external_key: key,
        })
    }
}

#[derive(Default)]
pub struct RecordingPayments {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub requests: Mutex<Vec<SessionRequest>>,
    pub(crate) sessions: Mutex<HashMap<String, CheckoutSession>>,
}

impl RecordingPayments {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SessionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentProcessor for RecordingPayments {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PaymentError::Declined("api_key_invalid sk_test_123".to_string()));
        }

        // Same key, same session.
        let mut sessions = self.sessions.lock().unwrap();
        let n = sessions.len();
        let session = sessions
            .entry(request.idempotency_key.clone())
            .or_insert_with(|| CheckoutSession {
                session_id: format!("cs_test_{}", n),
                redirect_url: format!("https://pay.test/c/cs_test_{}", n),
            });
        Ok(session.clone())
    }
}

#[derive(Default)]
pub struct RecordingStore {
    pub existing_files: u64,
    pub fail_file_inserts: bool,
    pub fail_boost_inserts: bool,
    pub fail_post_inserts: bool,
    pub files: Mutex<Vec<UploadedFileRecord>>,
    pub boosts: Mutex<Vec<BoostRecord>>,
    pub posts: Mutex<Vec<Post>>,
    pub inserts: AtomicUsize,
}

impl RecordingStore {
    pub fn with_existing_files(existing_files: u64) -> Self {
        Self {
            existing_files,
            ..Self::default()
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackingStore for RecordingStore {
    async fn count_uploaded_files(&self, _owner_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.existing_files)
    }

    async fn insert_uploaded_file(
        &self,
        record: UploadedFileRecord,
    ) -> Result<UploadedFileRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_file_inserts {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        self.files.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn insert_boost(&self, record: BoostRecord) -> Result<BoostRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_boost_inserts {
            return Err(StoreError::Query("deadlock detected".to_string()));
        }
        let mut boosts = self.boosts.lock().unwrap();
        if boosts
            .iter()
            .any(|b| b.external_session_id == record.external_session_id)
        {
            return Err(StoreError::Constraint("boosts_external_session_id_key".to_string()));
        }
        boosts.push(record.clone());
        Ok(record)
    }

    async fn find_boost_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<BoostRecord>, StoreError> {
        Ok(self
            .boosts
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.external_session_id == session_id)
            .cloned())
    }

    async fn insert_post(&self, post: Post) -> Result<Post, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_post_inserts {
            return Err(StoreError::Query("disk full".to_string()));
        }
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAudit {
    fn emit(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Counter-only limiter for guard tests; windows never expire.
#[derive(Default)]
pub struct CountingLimiter {
    pub counts: Mutex<HashMap<String, u32>>,
    pub broken: bool,
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn check(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        if self.broken {
            return Err(RateLimitError::Backend("connection refused".to_string()));
        }
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(key.to_string()).or_insert(0);
        let limited = *count >= policy.max_attempts;
        if !limited {
            *count += 1;
        }
        Ok(RateLimitResult {
            limited,
            remaining: policy.max_attempts.saturating_sub(*count),
            reset_after: policy.window,
        })
    }

    async fn remaining_time(&self, _key: &str) -> Result<Duration, RateLimitError> {
        Ok(Duration::ZERO)
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.counts.lock().unwrap().remove(key);
        Ok(())
    }
}
