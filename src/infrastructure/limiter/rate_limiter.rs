use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    errors::StoreError,
    repositories::rate_limit::{RateDecision, RateLimitPolicy, RateLimitStore, StoreStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

/// Process-local fixed-window counters keyed by fingerprint.
///
/// The `DashMap` entry guard holds the shard lock for the whole
/// check-and-increment, so two workers can never both pass the last slot.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimitStore {
    map: Arc<DashMap<String, RateLimitEntry>>,
    policy: RateLimitPolicy,
}

impl InMemoryRateLimitStore {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            policy,
        }
    }

    fn fresh_entry(&self, now: DateTime<Utc>) -> RateLimitEntry {
        RateLimitEntry {
            count: 1,
            window_reset_at: now + self.policy.window,
        }
    }

    pub fn check(&self, key: &str, now: DateTime<Utc>) -> RateDecision {
        match self.map.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                let entry = self.fresh_entry(now);
                slot.insert(entry);
                RateDecision::Allowed { count: entry.count, reset_at: entry.window_reset_at }
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();

                if now > entry.window_reset_at {
                    *entry = self.fresh_entry(now);
                } else if entry.count >= self.policy.max_requests {
                    return RateDecision::Limited { reset_at: entry.window_reset_at };
                } else {
                    entry.count += 1;
                }

                RateDecision::Allowed { count: entry.count, reset_at: entry.window_reset_at }
            }
        }
    }

    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.map.get(key).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops entries whose window has closed. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| now <= entry.window_reset_at);
        before.saturating_sub(self.map.len())
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        Ok(self.check(fingerprint, now))
    }

    async fn status(&self) -> StoreStatus {
        StoreStatus::ok(format!("in-memory ({} tracked clients)", self.len()))
    }
}
