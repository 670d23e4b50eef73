//! Fixed-window issuance limiter over any cache backend

use async_trait::async_trait;
use std::sync::Arc;

use gym_shared::contact::mask_contact;

use super::traits::{CacheServiceTrait, RateLimiterTrait};

/// Counts issuances per target in a cache counter that expires with the window.
///
/// Cache failures fail open: `is_allowed` answers `true` and `increment`
/// only logs.
pub struct CacheRateLimiter<C: CacheServiceTrait + ?Sized> {
    cache: Arc<C>,
    namespace: String,
    window_seconds: u64,
    max_requests: u32,
}

impl<C: CacheServiceTrait + ?Sized> CacheRateLimiter<C> {
    /// Create a limiter allowing `max_requests` issuances per `window_seconds`
    pub fn new(
        cache: Arc<C>,
        namespace: impl Into<String>,
        window_seconds: u64,
        max_requests: u32,
    ) -> Self {
        Self {
            cache,
            namespace: namespace.into(),
            window_seconds,
            max_requests,
        }
    }

    /// Counter key for a target, e.g. `otp:ratelimit:+15551234567`
    pub fn counter_key(&self, key: &str) -> String {
        format!("{}:ratelimit:{}", self.namespace, key)
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    /// Give a counter that lost its expiry a fresh window
    async fn rearm_window(&self, counter_key: &str, key: &str) {
        if let Ok(None) = self.cache.ttl(counter_key).await {
            tracing::warn!(
                target_contact = %mask_contact(key),
                event = "rate_limit_window_rearmed",
                "Rate limit counter had no expiry"
            );
            if let Err(e) = self.cache.expire(counter_key, self.window_seconds).await {
                tracing::warn!(
                    target_contact = %mask_contact(key),
                    error = %e,
                    event = "rate_limit_expire_failed",
                    "Failed to set rate limit window"
                );
            }
        }
    }
}

#[async_trait]
impl<C: CacheServiceTrait + ?Sized> RateLimiterTrait for CacheRateLimiter<C> {
    async fn is_allowed(&self, key: &str) -> bool {
        let counter_key = self.counter_key(key);
        match self.cache.get(&counter_key).await {
            Ok(None) => true,
            Ok(Some(raw)) => {
                let count = raw.parse::<u64>().unwrap_or(0);
                if count < self.max_requests as u64 {
                    return true;
                }
                self.rearm_window(&counter_key, key).await;
                false
            }
            Err(e) => {
                tracing::warn!(
                    target_contact = %mask_contact(key),
                    error = %e,
                    event = "rate_limit_check_failed",
                    "Rate limiter cache unavailable, allowing request"
                );
                true
            }
        }
    }

    async fn increment(&self, key: &str) {
        let counter_key = self.counter_key(key);

        // The window and its expiry are created together; later hits only count
        if let Err(e) = self.cache.set_if_absent(&counter_key, "0", self.window_seconds).await {
            tracing::warn!(
                target_contact = %mask_contact(key),
                error = %e,
                event = "rate_limit_window_failed",
                "Failed to open rate limit window"
            );
            return;
        }

        if let Err(e) = self.cache.increment(&counter_key).await {
            tracing::warn!(
                target_contact = %mask_contact(key),
                error = %e,
                event = "rate_limit_increment_failed",
                "Failed to increment rate limit counter"
            );
        }
    }

    async fn retry_after(&self, key: &str) -> Option<u64> {
        self.cache.ttl(&self.counter_key(key)).await.ok().flatten()
    }
}
