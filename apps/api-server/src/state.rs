//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use gateway_core::ports::{
    AuditSink, BackingStore, BlobStore, IdentityVerifier, PaymentProcessor, RateLimiter,
};
use gateway_core::services::{
    ActionGuard, CheckoutService, CheckoutSettings, PostService, UploadService, UploadSettings,
};
use gateway_infra::{
    InMemoryBackingStore, InMemoryBlobStore, InMemoryRateLimiter, JwtIdentityVerifier,
    RateLimitConfig, StubPaymentProcessor, TracingAuditSink,
};

use crate::config::{AppConfig, LimiterBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub guard: ActionGuard,
    pub identity: Arc<dyn IdentityVerifier>,
    pub posts: Arc<PostService>,
    pub uploads: Arc<UploadService>,
    pub checkout: Arc<CheckoutService>,
    pub upload_max_files: usize,
    pub call_timeout: Duration,
    pub trust_proxy_headers: bool,
    /// Present when the process-local limiter is in use, so the sweep job can reach it.
    pub local_limiter: Option<Arc<InMemoryRateLimiter>>,
}

/// The adapters the services are built from.
pub struct Adapters {
    pub limiter: Arc<dyn RateLimiter>,
    pub local_limiter: Option<Arc<InMemoryRateLimiter>>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub blobs: Arc<dyn BlobStore>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub store: Arc<dyn BackingStore>,
    pub audit: Arc<dyn AuditSink>,
}

impl Adapters {
    /// Process-local adapters only. Used when nothing external is configured
    /// and by tests.
    pub fn in_memory(identity: Arc<dyn IdentityVerifier>) -> Self {
        let limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig::default()));
        Self {
            limiter: limiter.clone(),
            local_limiter: Some(limiter),
            identity,
            blobs: Arc::new(InMemoryBlobStore::default()),
            payments: Arc::new(StubPaymentProcessor::default()),
            store: Arc::new(InMemoryBackingStore::new()),
            audit: Arc::new(TracingAuditSink),
        }
    }
}

impl AppState {
    /// Build the application state, falling back to in-memory adapters for
    /// every external service that is not configured or not reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let mut adapters = Adapters::in_memory(Arc::new(JwtIdentityVerifier::from_env()));

        if config.rate_limit.backend == LimiterBackend::Redis {
            build_redis_limiter(&mut adapters).await;
        } else {
            let limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.memory.clone()));
            adapters.limiter = limiter.clone();
            adapters.local_limiter = Some(limiter);
        }

        build_store(config, &mut adapters).await;
        build_http_clients(&mut adapters);

        tracing::info!("Application state initialized");
        Self::from_adapters(config, adapters)
    }

    pub fn from_adapters(config: &AppConfig, adapters: Adapters) -> Self {
        let guard = ActionGuard::new(adapters.limiter, config.rate_limit.policies.clone());

        let posts = PostService::new(
            adapters.identity.clone(),
            adapters.store.clone(),
            adapters.audit.clone(),
            config.call_timeout,
        );
        let uploads = UploadService::new(
            adapters.identity.clone(),
            adapters.blobs,
            adapters.store.clone(),
            adapters.audit.clone(),
            UploadSettings {
                max_concurrency: config.upload.concurrency,
                call_timeout: config.call_timeout,
            },
        );
        let checkout = CheckoutService::new(
            adapters.identity.clone(),
            adapters.payments,
            adapters.store,
            adapters.audit,
            CheckoutSettings {
                call_timeout: config.call_timeout,
                idempotency_bucket: config.checkout_idempotency_bucket,
                ..CheckoutSettings::default()
            },
        );

        Self {
            guard,
            identity: adapters.identity,
            posts: Arc::new(posts),
            uploads: Arc::new(uploads),
            checkout: Arc::new(checkout),
            upload_max_files: config.upload.max_files,
            call_timeout: config.call_timeout,
            trust_proxy_headers: config.trust_proxy_headers,
            local_limiter: adapters.local_limiter,
        }
    }
}

#[cfg(feature = "redis")]
async fn build_redis_limiter(adapters: &mut Adapters) {
    match gateway_infra::RedisRateLimiter::from_env().await {
        Ok(limiter) => {
            adapters.limiter = Arc::new(limiter);
            adapters.local_limiter = None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis. Using in-memory rate limiter.");
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn build_redis_limiter(_adapters: &mut Adapters) {
    tracing::warn!("RATE_LIMIT_BACKEND=redis but the redis feature is disabled. Using in-memory rate limiter.");
}

#[cfg(feature = "postgres")]
async fn build_store(config: &AppConfig, adapters: &mut Adapters) {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return;
    };

    match gateway_infra::database::connect(db_config).await {
        Ok(conn) => adapters.store = Arc::new(gateway_infra::PostgresBackingStore::new(conn)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_store(_config: &AppConfig, _adapters: &mut Adapters) {
    tracing::info!("Running without postgres feature - using in-memory backing store");
}

#[cfg(feature = "http")]
fn build_http_clients(adapters: &mut Adapters) {
    use gateway_infra::{HttpBlobStore, HttpBlobStoreConfig, HttpPaymentConfig, HttpPaymentProcessor};

    match HttpBlobStoreConfig::from_env().map(HttpBlobStore::new) {
        Some(Ok(store)) => adapters.blobs = Arc::new(store),
        Some(Err(e)) => tracing::error!(error = %e, "Invalid blob store client. Using in-memory blob store."),
        None => tracing::warn!("BLOB_STORE_URL not set. Using in-memory blob store."),
    }

    match HttpPaymentConfig::from_env().map(HttpPaymentProcessor::new) {
        Some(Ok(processor)) => adapters.payments = Arc::new(processor),
        Some(Err(e)) => tracing::error!(error = %e, "Invalid payment client. Using stub processor."),
        None => tracing::warn!("PAYMENT_API_URL not set. Using stub payment processor."),
    }
}

#[cfg(not(feature = "http"))]
fn build_http_clients(_adapters: &mut Adapters) {
    tracing::info!("Running without http feature - using in-memory blob store and stub payments");
}
