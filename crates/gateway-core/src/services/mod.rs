//! Orchestration services - the caller-facing actions of the gateway.

mod checkout;
mod guard;
mod post;
mod upload;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;

use crate::domain::Identity;
use crate::error::{GatewayError, GatewayResult};
use crate::ports::IdentityVerifier;

pub use checkout::{CheckoutService, CheckoutSettings, idempotency_key};
pub use guard::{ActionGuard, ActionKind, ActionPolicies};
pub use post::{MAX_POST_LENGTH, PostService};
pub use upload::{UploadService, UploadSettings, UploadStage};

/// Failure of an external call made under a deadline.
#[derive(Debug)]
pub(crate) enum CallFailure<E> {
    TimedOut(Duration),
    Failed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CallFailure<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
            Self::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Run an external call with a deadline. The gateway never retries.
pub(crate) async fn call_with_timeout<T, E, F>(limit: Duration, call: F) -> Result<T, CallFailure<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CallFailure::Failed(e)),
        Err(_) => Err(CallFailure::TimedOut(limit)),
    }
}

/// Who is calling: a raw credential, or an identity the front end already
/// resolved from one.
#[derive(Debug, Clone)]
pub enum Caller<'a> {
    Token(&'a str),
    Verified(Identity),
}

impl<'a> From<&'a str> for Caller<'a> {
    fn from(token: &'a str) -> Self {
        Self::Token(token)
    }
}

impl From<Identity> for Caller<'_> {
    fn from(identity: Identity) -> Self {
        Self::Verified(identity)
    }
}

/// Resolve the caller. Rejected credentials map to `Unauthorized`; a provider
/// that fails to answer maps to `Upstream`.
pub(crate) async fn resolve_identity(
    verifier: &dyn IdentityVerifier,
    caller: Caller<'_>,
    limit: Duration,
) -> GatewayResult<Identity> {
    let token = match caller {
        Caller::Verified(identity) => return Ok(identity),
        Caller::Token(token) => token,
    };
    if token.trim().is_empty() {
        return Err(GatewayError::Unauthorized);
    }

    match call_with_timeout(limit, verifier.resolve(token)).await {
        Ok(identity) => Ok(identity),
        Err(CallFailure::Failed(e)) if e.is_rejection() => {
            tracing::debug!(error = %e, "Caller credential rejected");
            Err(GatewayError::Unauthorized)
        }
        Err(e) => Err(GatewayError::upstream("resolve_identity", e)),
    }
}
