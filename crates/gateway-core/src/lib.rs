//! # Gateway Core
//!
//! The domain layer of the action gateway: rate limiting contracts, input
//! validation and the orchestration flows that guard every state-changing
//! action (posting, file upload, paid boost checkout).
//!
//! This crate contains no infrastructure. Identity, blob storage, payments and
//! persistence are reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod validation;

pub use error::{GatewayError, GatewayResult};
