use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::errors::StoreError;

/// Fixed-window quota: `max_requests` per `window`, counted from the first
/// request of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { count: u32, reset_at: DateTime<Utc> },
    Limited { reset_at: DateTime<Utc> },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Reachability of a rate-limit backend, as reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub available: bool,
    pub detail: String,
}

impl StoreStatus {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self { available: true, detail: detail.into() }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self { available: false, detail: detail.into() }
    }
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one request for `fingerprint` if it fits in the current window.
    /// Must be atomic per key; a `Limited` decision leaves the counter untouched.
    async fn check_and_increment(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError>;

    async fn status(&self) -> StoreStatus;
}
