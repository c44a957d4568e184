//! Observability module - alerting on critical log events.

mod alert;

pub use alert::{AlertConfig, AlertLayer};
