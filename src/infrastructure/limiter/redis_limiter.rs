use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use deadpool_redis::Pool;
use redis::Script;

use crate::{
    constants::RATE_LIMIT_KEY_PREFIX,
    errors::StoreError,
    repositories::rate_limit::{RateDecision, RateLimitPolicy, RateLimitStore, StoreStatus},
};

// KEYS[1] = counter key, ARGV[1] = limit, ARGV[2] = window in ms.
// Returns {allowed, count, pttl}. A rejected request does not touch the key.
const FIXED_WINDOW_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
  return {0, current, redis.call('PTTL', KEYS[1])}
end
current = redis.call('INCR', KEYS[1])
if current == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return {1, current, redis.call('PTTL', KEYS[1])}
"#;

/// Fixed-window counters shared by every instance through Redis. Each key
/// carries the window as its TTL, so idle clients expire on their own.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: Pool,
    policy: RateLimitPolicy,
    script: Arc<Script>,
}

impl RedisRateLimitStore {
    pub fn new(pool: Pool, policy: RateLimitPolicy) -> Self {
        Self {
            pool,
            policy,
            script: Arc::new(Script::new(FIXED_WINDOW_SCRIPT)),
        }
    }
}

/// Normalize to URL-encoding to keep arbitrary fingerprints safe as Redis keys.
pub fn rate_limit_key(fingerprint: &str) -> String {
    format!("{}:{}", RATE_LIMIT_KEY_PREFIX, urlencoding::encode(fingerprint))
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn check_and_increment(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        let mut conn = self.pool.get().await?;
        let window_ms = self.policy.window.num_milliseconds();

        let (allowed, count, pttl): (i64, i64, i64) = self.script
            .key(rate_limit_key(fingerprint))
            .arg(self.policy.max_requests)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        // PTTL is negative when the key has no expiry; treat it as a full window
        let remaining = if pttl > 0 { pttl } else { window_ms };
        let reset_at = now + Duration::milliseconds(remaining);

        if allowed == 1 {
            let count = u32::try_from(count)
                .map_err(|_| StoreError::Operation(format!("counter out of range: {count}")))?;
            Ok(RateDecision::Allowed { count, reset_at })
        } else {
            Ok(RateDecision::Limited { reset_at })
        }
    }

    async fn status(&self) -> StoreStatus {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Redis pool unavailable for health check: {}", e);
                return StoreStatus::unavailable("redis: Unavailable");
            }
        };

        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match pong {
            Ok(pong) if pong == "PONG" => StoreStatus::ok("redis: OK"),
            _ => StoreStatus::unavailable("redis: Unavailable"),
        }
    }
}
