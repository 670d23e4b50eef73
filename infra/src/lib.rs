//! Infrastructure layer for the GymFlow OTP backend
//!
//! This crate provides the concrete adapters behind the core traits:
//! - Redis and in-memory caches implementing `CacheServiceTrait`
//! - MySQL repositories for OTP records and accounts (sqlx)
//! - The OTP delivery sink

pub mod cache;
pub mod database;
pub mod delivery;

pub use cache::{MemoryCache, RedisClient};
pub use database::{DatabasePool, MySqlAccountRepository, MySqlOtpRecordRepository};
pub use delivery::LogDelivery;

/// Infrastructure layer errors
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InfrastructureError::Config("Invalid Redis URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid Redis URL");

        let err = InfrastructureError::Delivery("channel closed".to_string());
        assert_eq!(err.to_string(), "Delivery error: channel closed");
    }
}
