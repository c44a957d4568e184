//! Redis fixed-window rate limiter shared across gateway instances.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use gateway_core::ports::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimiter};

const DEFAULT_URL: &str = "redis://localhost:6379";
const DEFAULT_PREFIX: &str = "ratelimit";

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Namespace in front of every limiter key, so several deployments can share one Redis.
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl RedisConfig {
    /// `REDIS_URL`, `REDIS_CONNECT_TIMEOUT_SECS`, `RATE_LIMIT_KEY_PREFIX`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            url: env("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: env("REDIS_CONNECT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            key_prefix: env("RATE_LIMIT_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

// Returns {limited, count, pttl_ms}. A limited attempt neither increments
// the counter nor extends the window.
const CHECK_SCRIPT: &str = r#"
local key = KEYS[1]
local max_attempts = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])

local current = tonumber(redis.call('GET', key) or '0')
if current > 0 and current >= max_attempts then
    return {1, current, redis.call('PTTL', key)}
end

current = redis.call('INCR', key)
local ttl = redis.call('PTTL', key)
if current == 1 or ttl < 0 then
    redis.call('PEXPIRE', key, window_ms)
    ttl = window_ms
end
return {0, current, ttl}
"#;

/// Redis-backed limiter. The check runs as one Lua script, so it is atomic
/// per key across every process sharing the Redis instance.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisConfig) -> Result<Self, RateLimitError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RateLimitError::Backend("Connection timed out".to_string()))?
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script: Script::new(CHECK_SCRIPT),
        })
    }

    pub async fn from_env() -> Result<Self, RateLimitError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        let mut conn = self.conn.clone();
        let window_ms = policy.window.as_millis().max(1) as u64;

        let reply: Vec<i64> = self
            .script
            .key(self.namespaced(key))
            .arg(policy.max_attempts)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let [limited, count, ttl_ms] = reply[..] else {
            return Err(RateLimitError::Backend(format!(
                "unexpected script reply: {:?}",
                reply
            )));
        };

        let count = u32::try_from(count).unwrap_or(u32::MAX);
        Ok(RateLimitResult {
            limited: limited == 1,
            remaining: policy.max_attempts.saturating_sub(count),
            reset_after: Duration::from_millis(ttl_ms.max(0) as u64),
        })
    }

    async fn remaining_time(&self, key: &str) -> Result<Duration, RateLimitError> {
        let mut conn = self.conn.clone();
        let ttl_ms: i64 = conn
            .pttl(self.namespaced(key))
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // -2 (no key) and -1 (no expiry) both mean no open window.
        Ok(Duration::from_millis(ttl_ms.max(0) as u64))
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.namespaced(key))
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `None` when no Redis is reachable; the tests below then pass vacuously.
    async fn connect_or_skip() -> Option<RedisRateLimiter> {
        RedisRateLimiter::new(RedisConfig {
            connect_timeout: Duration::from_secs(1),
            key_prefix: format!("gateway_test_{}", uuid::Uuid::new_v4()),
            ..RedisConfig::from_env()
        })
        .await
        .ok()
    }

    #[tokio::test]
    async fn test_redis_fixed_window() {
        let Some(limiter) = connect_or_skip().await else {
            return;
        };
        let policy = RateLimitPolicy::new(2, Duration::from_secs(1));

        let res = limiter.check("user_1", policy).await.unwrap();
        assert!(!res.limited);
        assert_eq!(res.remaining, 1);

        let res = limiter.check("user_1", policy).await.unwrap();
        assert!(!res.limited);
        assert_eq!(res.remaining, 0);

        let res = limiter.check("user_1", policy).await.unwrap();
        assert!(res.limited);
        assert!(res.reset_after <= Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let res = limiter.check("user_1", policy).await.unwrap();
        assert!(!res.limited);
    }

    #[tokio::test]
    async fn test_redis_reset_and_remaining_time() {
        let Some(limiter) = connect_or_skip().await else {
            return;
        };
        let policy = RateLimitPolicy::new(1, Duration::from_secs(30));

        assert_eq!(limiter.remaining_time("user_2").await.unwrap(), Duration::ZERO);

        limiter.check("user_2", policy).await.unwrap();
        assert!(limiter.check("user_2", policy).await.unwrap().limited);
        assert!(limiter.remaining_time("user_2").await.unwrap() > Duration::ZERO);

        limiter.reset("user_2").await.unwrap();
        assert!(!limiter.check("user_2", policy).await.unwrap().limited);
    }
}
