//! Identity verification port.

use async_trait::async_trait;

use crate::domain::Identity;

/// Resolves a caller credential into an identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Identity resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Whether the credential itself was rejected, as opposed to the
    /// provider failing to answer.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }
}
