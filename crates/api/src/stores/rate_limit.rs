//! Fixed-window rate limiting.
//!
//! Each key owns one counter per window. The first request in a window opens it
//! (`count = 1`, expires at `now + window`), later requests increment the counter
//! until it reaches the limit, after which requests are rejected without touching
//! the counter until the window expires. Bursts of up to `2 × limit` across a window
//! boundary are possible and accepted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use crate::clock::Clock;

/// Shortest window a policy may use.
const MIN_WINDOW: Duration = Duration::from_millis(1);

/// Limit and window for one class of requests (e.g. login attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Max accepted requests per window. At least 1.
    pub limit: u32,
    /// At least one millisecond.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Zero limits and windows are raised to the minimum so a bad value
    /// can never turn limiting off.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window: window.max(MIN_WINDOW),
        }
    }
}

/// Outcome of a single `check_and_consume` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, never less than 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Rate limiter trait for checking and consuming request quota.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count a request against `key` and report whether it is allowed.
    /// Rejected requests do not consume quota.
    async fn check_and_consume(&self, key: &str, policy: RateLimitPolicy)
    -> Result<RateLimitDecision>;

    /// Drop windows that have already expired. Returns the number removed.
    async fn sweep_expired(&self) -> usize;
}

fn window_end(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

struct WindowEntry {
    count: u32,
    window_expires_at: DateTime<Utc>,
}

/// Process-local rate limiter.
///
/// Counters are not shared between server instances: behind N instances the
/// effective limit is `N × limit`. Use [`RedisRateLimiter`] for a shared counter.
pub struct InMemoryRateLimiter {
    entries: DashMap<String, WindowEntry>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of tracked keys, including expired ones not yet swept.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn consume(&self, key: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        let now = self.clock.now();
        let limit = policy.limit.max(1);

        // The entry guard holds the shard lock, so check-and-increment is atomic per key.
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                window_expires_at: now,
            });

        if entry.window_expires_at <= now {
            entry.count = 1;
            entry.window_expires_at = window_end(now, policy.window);
            return RateLimitDecision {
                allowed: true,
                remaining: limit - 1,
                reset_at: entry.window_expires_at,
            };
        }

        if entry.count >= limit {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: entry.window_expires_at,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: limit - entry.count,
            reset_at: entry.window_expires_at,
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_consume(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision> {
        Ok(self.consume(key, policy))
    }

    async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.window_expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

/// Open a window on the first hit, reject at the limit without incrementing.
/// Returns {allowed, count, pttl}.
const FIXED_WINDOW_SCRIPT: &str = r#"
local count = tonumber(redis.call('GET', KEYS[1]) or '0')
local limit = tonumber(ARGV[1])
if count == 0 then
  redis.call('SET', KEYS[1], 1, 'PX', ARGV[2])
  return {1, 1, tonumber(ARGV[2])}
end
local ttl = redis.call('PTTL', KEYS[1])
if count >= limit then
  return {0, count, ttl}
end
count = redis.call('INCR', KEYS[1])
return {1, count, ttl}
"#;

/// Redis implementation of RateLimiter, shared by every server instance.
///
/// Expiry is handled by Redis key TTLs, so there is nothing to sweep.
pub struct RedisRateLimiter {
    client: redis::Client,
    clock: Arc<dyn Clock>,
    script: redis::Script,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            script: redis::Script::new(FIXED_WINDOW_SCRIPT),
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_consume(
        &self,
        key: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let limit = policy.limit.max(1);
        let window_ms = policy.window.as_millis().max(1) as u64;

        let (allowed, count, ttl_ms): (i64, i64, i64) = self
            .script
            .key(format!("ratelimit:{}", key))
            .arg(limit)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        let now = self.clock.now();
        let ttl = if ttl_ms > 0 {
            Duration::from_millis(ttl_ms as u64)
        } else {
            policy.window
        };
        let allowed = allowed == 1;

        Ok(RateLimitDecision {
            allowed,
            remaining: if allowed {
                limit.saturating_sub(count.max(0) as u32)
            } else {
                0
            },
            reset_at: window_end(now, ttl),
        })
    }

    async fn sweep_expired(&self) -> usize {
        0
    }
}

/// Periodically sweep expired windows so one-shot clients don't accumulate.
pub fn spawn_sweeper(limiter: Arc<dyn RateLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "swept expired rate limit windows");
            }
        }
    })
}
