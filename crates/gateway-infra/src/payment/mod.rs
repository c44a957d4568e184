//! Payment processor implementations.

#[cfg(feature = "http")]
mod http;
mod stub;

#[cfg(feature = "http")]
pub use http::{HttpPaymentConfig, HttpPaymentProcessor};
pub use stub::StubPaymentProcessor;
