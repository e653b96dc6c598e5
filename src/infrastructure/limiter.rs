pub mod rate_limiter;
pub mod redis_limiter;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    db::redis::create_pool,
    errors::StoreError,
    repositories::rate_limit::{RateDecision, RateLimitPolicy, RateLimitStore, StoreStatus},
    settings::{AppConfig, MAX_RATE_LIMIT_WINDOW_SECS},
};
use rate_limiter::InMemoryRateLimitStore;
use redis_limiter::RedisRateLimitStore;

/// The rate-limit store selected at startup.
#[derive(Clone)]
pub enum RateLimitBackend {
    Memory(InMemoryRateLimitStore),
    Redis(RedisRateLimitStore),
}

impl RateLimitBackend {
    /// Redis when `redis_url` is configured, otherwise process-local counters.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let policy = policy_from(config);

        match &config.redis_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                tracing::info!("Rate limiting backed by Redis");
                Ok(RateLimitBackend::Redis(RedisRateLimitStore::new(pool, policy)))
            }
            None => {
                tracing::info!("Rate limiting kept in process memory");
                Ok(RateLimitBackend::Memory(InMemoryRateLimitStore::new(policy)))
            }
        }
    }
}

pub fn policy_from(config: &AppConfig) -> RateLimitPolicy {
    // bounded by `AppConfig::validate`
    let window_secs = config.rate_limit_window_secs.min(MAX_RATE_LIMIT_WINDOW_SECS) as i64;
    RateLimitPolicy::new(config.rate_limit_max_requests, Duration::seconds(window_secs))
}

#[async_trait]
impl RateLimitStore for RateLimitBackend {
    async fn check_and_increment(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        match self {
            RateLimitBackend::Memory(store) => store.check_and_increment(fingerprint, now).await,
            RateLimitBackend::Redis(store) => store.check_and_increment(fingerprint, now).await,
        }
    }

    async fn status(&self) -> StoreStatus {
        match self {
            RateLimitBackend::Memory(store) => store.status().await,
            RateLimitBackend::Redis(store) => store.status().await,
        }
    }
}
