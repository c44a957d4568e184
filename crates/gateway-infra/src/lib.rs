//! # Gateway Infrastructure
//!
//! Concrete implementations of the ports defined in `gateway-core`:
//! rate limiter backends, identity verification, blob storage, payments,
//! the backing store and the audit sink.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL backing store via SeaORM
//! - `auth` - JWT identity verification
//! - `redis` - Redis rate limiter shared across instances
//! - `http` - HTTP blob store and payment processor clients

pub mod audit;
pub mod blob;
pub mod database;
pub mod payment;
pub mod rate_limit;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use audit::TracingAuditSink;
pub use blob::InMemoryBlobStore;
pub use database::{DatabaseConfig, InMemoryBackingStore};
pub use payment::StubPaymentProcessor;
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtIdentityVerifier};

#[cfg(feature = "postgres")]
pub use database::PostgresBackingStore;

#[cfg(feature = "redis")]
pub use rate_limit::{RedisConfig, RedisRateLimiter};

#[cfg(feature = "http")]
pub use blob::{HttpBlobStore, HttpBlobStoreConfig};
#[cfg(feature = "http")]
pub use payment::{HttpPaymentConfig, HttpPaymentProcessor};
