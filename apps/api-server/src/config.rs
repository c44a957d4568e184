//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use gateway_core::domain::MAX_FILE_SIZE;
use gateway_core::ports::RateLimitPolicy;
use gateway_core::services::ActionPolicies;
use gateway_infra::{DatabaseConfig, RateLimitConfig};

/// Which limiter backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimiterBackend {
    Memory,
    Redis,
}

impl FromStr for LimiterBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown rate limit backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub backend: LimiterBackend,
    pub policies: ActionPolicies,
    pub memory: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_files: usize,
    pub concurrency: usize,
}

/// JSON framing around each file entry (name, mime type, keys).
const UPLOAD_ENTRY_OVERHEAD: usize = 4 * 1024;

impl UploadConfig {
    /// Largest JSON upload body accepted: a full batch of maximum-size files,
    /// base64 encoded.
    pub fn json_body_limit(&self) -> usize {
        let max_file = MAX_FILE_SIZE as usize;
        let encoded = max_file.div_ceil(3) * 4;
        self.max_files
            .max(1)
            .saturating_mul(encoded + UPLOAD_ENTRY_OVERHEAD)
            .saturating_add(UPLOAD_ENTRY_OVERHEAD)
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub rate_limit: RateLimitSettings,
    pub upload: UploadConfig,
    /// Deadline for every external call (identity, blob store, payments, database).
    pub call_timeout: Duration,
    pub checkout_idempotency_bucket: Duration,
    /// Take the client address from `Forwarded`/`X-Forwarded-For`. Only safe
    /// behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// `RATE_LIMIT_<NAME>_MAX` and `RATE_LIMIT_<NAME>_WINDOW_SECS`, falling back to `default`.
fn policy_from_env(name: &str, default: RateLimitPolicy) -> RateLimitPolicy {
    RateLimitPolicy::new(
        parse_or(&format!("RATE_LIMIT_{}_MAX", name), default.max_attempts),
        Duration::from_secs(parse_or(
            &format!("RATE_LIMIT_{}_WINDOW_SECS", name),
            default.window.as_secs(),
        )),
    )
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = ActionPolicies::default();
        let backend = env::var("RATE_LIMIT_BACKEND")
            .ok()
            .and_then(|v| match v.parse() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring RATE_LIMIT_BACKEND");
                    None
                }
            })
            .unwrap_or(LimiterBackend::Memory);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database: DatabaseConfig::from_env(),
            rate_limit: RateLimitSettings {
                backend,
                policies: ActionPolicies {
                    create_post: policy_from_env("POST", defaults.create_post),
                    upload_files: policy_from_env("UPLOAD", defaults.upload_files),
                    start_checkout: policy_from_env("CHECKOUT", defaults.start_checkout),
                },
                memory: RateLimitConfig::from_env(),
            },
            upload: UploadConfig {
                max_files: parse_or("UPLOAD_MAX_FILES", 10),
                concurrency: parse_or("UPLOAD_CONCURRENCY", 4),
            },
            call_timeout: Duration::from_millis(parse_or("EXTERNAL_CALL_TIMEOUT_MS", 15_000)),
            checkout_idempotency_bucket: Duration::from_secs(parse_or(
                "CHECKOUT_IDEMPOTENCY_BUCKET_SECS",
                600,
            )),
            trust_proxy_headers: parse_or("TRUST_PROXY_HEADERS", false),
        }
    }
}
