//! Traits for cache, rate limiter and delivery integration

use async_trait::async_trait;

use crate::domain::entities::TargetType;

/// Trait for cache service integration
///
/// Absence of a key is never an error: `get` returns `Ok(None)` and `delete`
/// returns `Ok(false)`.
#[async_trait]
pub trait CacheServiceTrait: Send + Sync {
    /// Store a value with a time-to-live in seconds
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), String>;
    /// Store a value with a time-to-live only if the key is absent, returning whether it was written
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, String>;
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    /// Delete a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, String>;
    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool, String>;
    /// Atomically increment a counter, returning the new value
    async fn increment(&self, key: &str) -> Result<i64, String>;
    /// Set a time-to-live in seconds on an existing key
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), String>;
    /// Remaining time-to-live in seconds, `None` when absent or without expiry
    async fn ttl(&self, key: &str) -> Result<Option<u64>, String>;
}

/// Rate limiting for OTP issuance
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Check whether another issuance is allowed for the key
    async fn is_allowed(&self, key: &str) -> bool;
    /// Record an issuance for the key
    async fn increment(&self, key: &str);
    /// Seconds until the current window resets, when known
    async fn retry_after(&self, key: &str) -> Option<u64>;
}

/// Trait for handing an issued code to its recipient
#[async_trait]
pub trait OtpDeliveryTrait: Send + Sync {
    /// Deliver a code to the target's contact channel
    async fn deliver(&self, target: &str, target_type: TargetType, code: &str) -> Result<(), String>;
}
