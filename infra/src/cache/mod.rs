//! Cache backends for live OTP codes and rate-limit counters
//!
//! Both backends implement `gym_core::CacheServiceTrait`, so the OTP engine
//! and the rate limiter can run over Redis in deployment and over the
//! in-process cache in development and tests.

pub mod memory_cache;
pub mod redis_client;


pub use memory_cache::MemoryCache;
pub use redis_client::RedisClient;

pub use gym_shared::config::CacheConfig;
