//! In-memory fixed-window rate limiter.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use gateway_core::ports::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimiter};

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Upper bound on tracked keys. When full, expired records are swept;
    /// if that frees nothing, attempts for new keys are refused.
    pub max_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_keys: 100_000 }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            max_keys: std::env::var("RATE_LIMIT_MAX_KEYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100_000),
        }
    }
}

#[derive(Debug, Clone)]
struct RateRecord {
    count: u32,
    window_end: Instant,
}

impl RateRecord {
    fn open(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_end: now + window,
        }
    }

    /// The end instant itself already belongs to the next window.
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.window_end
    }

    fn remaining_time(&self, now: Instant) -> Duration {
        self.window_end.saturating_duration_since(now)
    }
}

/// Per-process fixed-window limiter.
///
/// Each key's check runs under its DashMap shard lock, so concurrent checks
/// of one key never both observe a free slot. Limits are not shared across
/// instances; use `RedisRateLimiter` for that.
pub struct InMemoryRateLimiter {
    records: DashMap<String, RateRecord>,
    config: RateLimitConfig,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(RateLimitConfig::from_env())
    }

    /// Number of keys currently tracked, expired or not.
    pub fn tracked_keys(&self) -> usize {
        self.records.len()
    }

    /// Drop every record whose window has ended. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }

    fn has_room_for(&self, key: &str) -> bool {
        if self.records.contains_key(key) || self.records.len() < self.config.max_keys {
            return true;
        }
        let swept = self.sweep_expired();
        tracing::debug!(swept, "Rate limiter at capacity, swept expired records");
        self.records.len() < self.config.max_keys
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        if !self.has_room_for(key) {
            tracing::warn!(
                key = %key,
                max_keys = self.config.max_keys,
                "Rate limiter full, refusing new key"
            );
            return Ok(RateLimitResult {
                limited: true,
                remaining: 0,
                reset_after: policy.window,
            });
        }

        let now = Instant::now();
        let result = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if record.is_expired(now) {
                    *record = RateRecord::open(now, policy.window);
                } else if record.count >= policy.max_attempts {
                    return Ok(RateLimitResult {
                        limited: true,
                        remaining: 0,
                        reset_after: record.remaining_time(now),
                    });
                } else {
                    record.count += 1;
                }
                RateLimitResult {
                    limited: false,
                    remaining: policy.max_attempts.saturating_sub(record.count),
                    reset_after: record.remaining_time(now),
                }
            }
            Entry::Vacant(vacant) => {
                let record = vacant.insert(RateRecord::open(now, policy.window));
                RateLimitResult {
                    limited: false,
                    remaining: policy.max_attempts.saturating_sub(record.count),
                    reset_after: record.remaining_time(now),
                }
            }
        };

        Ok(result)
    }

    async fn remaining_time(&self, key: &str) -> Result<Duration, RateLimitError> {
        let now = Instant::now();
        Ok(self
            .records
            .get(key)
            .map(|record| record.remaining_time(now))
            .unwrap_or(Duration::ZERO))
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        self.records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);
    const POLICY: RateLimitPolicy = RateLimitPolicy::new(3, WINDOW);

    fn limiter() -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fourth_attempt_is_limited() {
        let limiter = limiter();

        for expected_remaining in [2, 1, 0] {
            let res = limiter.check("k", POLICY).await.unwrap();
            assert!(!res.limited);
            assert_eq!(res.remaining, expected_remaining);
        }

        let res = limiter.check("k", POLICY).await.unwrap();
        assert!(res.limited);
        assert_eq!(res.reset_after, WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limited_attempts_do_not_extend_window() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check("k", POLICY).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(40)).await;
        for _ in 0..5 {
            assert!(limiter.check("k", POLICY).await.unwrap().limited);
        }

        tokio::time::advance(Duration::from_secs(20)).await;
        let res = limiter.check("k", POLICY).await.unwrap();
        assert!(!res.limited);
        assert_eq!(res.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets_after_elapsed() {
        let limiter = limiter();
        for _ in 0..4 {
            limiter.check("k", POLICY).await.unwrap();
        }

        tokio::time::advance(WINDOW).await;

        let res = limiter.check("k", POLICY).await.unwrap();
        assert!(!res.limited);
        assert_eq!(res.remaining, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_holds_until_its_end_instant() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check("k", POLICY).await.unwrap();
        }

        tokio::time::advance(WINDOW - Duration::from_millis(1)).await;
        assert!(limiter.check("k", POLICY).await.unwrap().limited);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!limiter.check("k", POLICY).await.unwrap().limited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_time_counts_down() {
        let limiter = limiter();
        assert_eq!(limiter.remaining_time("k").await.unwrap(), Duration::ZERO);

        limiter.check("k", POLICY).await.unwrap();
        let first = limiter.remaining_time("k").await.unwrap();
        assert!(first > Duration::ZERO && first <= WINDOW);

        tokio::time::advance(Duration::from_secs(10)).await;
        let second = limiter.remaining_time("k").await.unwrap();
        assert!(second < first);

        tokio::time::advance(WINDOW).await;
        assert_eq!(limiter.remaining_time("k").await.unwrap(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_unlimits_key() {
        let limiter = limiter();
        for _ in 0..4 {
            limiter.check("k", POLICY).await.unwrap();
        }

        limiter.reset("k").await.unwrap();

        assert!(!limiter.check("k", POLICY).await.unwrap().limited);
        assert!(limiter.reset("missing").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let limiter = limiter();
        for _ in 0..4 {
            limiter.check("a", POLICY).await.unwrap();
        }
        assert!(!limiter.check("b", POLICY).await.unwrap().limited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_expired_records() {
        let limiter = limiter();
        limiter.check("old", POLICY).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter
            .check("fresh", RateLimitPolicy::new(3, Duration::from_secs(120)))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert!(limiter.remaining_time("fresh").await.unwrap() > Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_limiter_sweeps_then_refuses_new_keys() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig { max_keys: 2 });
        limiter.check("a", POLICY).await.unwrap();
        limiter.check("b", POLICY).await.unwrap();

        assert!(limiter.check("c", POLICY).await.unwrap().limited);
        // Known keys keep working.
        assert!(!limiter.check("a", POLICY).await.unwrap().limited);

        tokio::time::advance(WINDOW).await;
        assert!(!limiter.check("c", POLICY).await.unwrap().limited);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_admit_at_most_max() {
        let limiter = Arc::new(limiter());
        let policy = RateLimitPolicy::new(10, WINDOW);

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check("shared", policy).await.unwrap() })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if !handle.await.unwrap().limited {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }
}
