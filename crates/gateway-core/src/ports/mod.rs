//! Ports - trait definitions for external collaborators.
//! These are the "interfaces" that infrastructure must implement.

mod audit;
mod blob_store;
mod identity;
mod payment;
mod rate_limit;
mod store;

pub use audit::{AuditSink, NoopAuditSink};
pub use blob_store::{BlobMetadata, BlobStore, BlobStoreError, StoredBlob};
pub use identity::{IdentityError, IdentityVerifier};
pub use payment::{CheckoutMetadata, CheckoutSession, PaymentError, PaymentProcessor, SessionRequest};
pub use rate_limit::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimiter};
pub use store::{BackingStore, StoreError};
