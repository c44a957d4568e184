//! Caller credential extraction.
//!
//! Handlers pass the raw token straight to the gateway services, which decide
//! whether it is acceptable. Extraction itself never fails.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header};
use gateway_core::services::Caller;

use crate::state::AppState;

/// Bearer token from the `Authorization` header, empty when absent or malformed.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn bearer_from(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(BearerToken(bearer_from(req).unwrap_or_default())))
    }
}

/// The caller of one request, as the limiter and the services see it.
pub struct RequestCaller<'a> {
    /// Who an attempt is counted against: the user id when the token
    /// resolves, otherwise the client address.
    pub subject: String,
    /// Carries the resolved identity so the service does not look it up again.
    pub caller: Caller<'a>,
}

/// Resolve the bearer token once per request. Failures are left for the
/// service to report.
pub async fn identify<'a>(state: &AppState, token: &'a BearerToken, req: &HttpRequest) -> RequestCaller<'a> {
    if !token.as_str().is_empty() {
        let resolved =
            tokio::time::timeout(state.call_timeout, state.identity.resolve(token.as_str())).await;
        if let Ok(Ok(identity)) = resolved {
            return RequestCaller {
                subject: identity.user_id.to_string(),
                caller: Caller::Verified(identity),
            };
        }
    }

    RequestCaller {
        subject: client_address(req, state.trust_proxy_headers),
        caller: Caller::Token(token.as_str()),
    }
}

/// The socket peer, or the forwarded client address when proxy headers are trusted.
fn client_address(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    let address = if trust_proxy_headers {
        req.connection_info().realip_remote_addr().map(str::to_string)
    } else {
        req.peer_addr().map(|addr| addr.ip().to_string())
    };
    address.unwrap_or_else(|| "unknown".to_string())
}
