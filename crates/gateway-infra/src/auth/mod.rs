//! Caller identity verification.

mod jwt;

pub use jwt::{JwtConfig, JwtIdentityVerifier};
