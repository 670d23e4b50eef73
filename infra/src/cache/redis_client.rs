//! Redis cache client implementation
//!
//! This module provides a Redis client with a multiplexed connection, retry
//! logic, and the cache operations the OTP engine needs: set with expiry,
//! get, delete, counters and TTL inspection.

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError, RedisResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use gym_core::CacheServiceTrait;
use gym_shared::config::CacheConfig;

use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Redis cache client with retry logic
///
/// Cloning is cheap: clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Maximum number of attempts per operation
    max_retries: u32,
    /// Base delay between retries (exponential backoff)
    retry_delay_ms: u64,
}

impl RedisClient {
    /// Connect to Redis using the cache configuration
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    ///
    /// # Example
    /// ```no_run
    /// use gym_infra::cache::{CacheConfig, RedisClient};
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let client = RedisClient::new(CacheConfig::new("redis://localhost:6379")).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!(
            url = %mask_url(&config.url),
            max_connections = config.max_connections,
            "Creating Redis client"
        );

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let max_retries = config.max_retries.max(1);
        let connection = Self::create_connection_with_retry(
            client,
            max_retries,
            config.retry_delay_ms,
            Duration::from_secs(config.connection_timeout),
        )
        .await?;

        info!("Redis client created successfully");

        Ok(Self {
            connection,
            max_retries,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
        connect_timeout: Duration,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let result = match tokio::time::timeout(connect_timeout, client.get_multiplexed_async_connection()).await {
                Ok(result) => result,
                Err(_) => Err(RedisError::from(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "Redis connection timed out",
                ))),
            };

            match result {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Set a value with expiration time in seconds
    pub async fn set_with_expiry(&self, key: &str, value: &str, expiry_seconds: u64) -> Result<(), InfrastructureError> {
        debug!("Setting key '{}' with expiry {}s", key, expiry_seconds);

        self.execute_with_retry("SET", |mut conn| {
            let key = key.to_string();
            let value = value.to_string();
            Box::pin(async move { conn.set_ex::<_, _, ()>(key, value, expiry_seconds).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to set key '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Set a value with expiry only if the key does not exist (`SET NX EX`)
    pub async fn set_nx_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<bool, InfrastructureError> {
        debug!("Setting key '{}' if absent with expiry {}s", key, expiry_seconds);

        let reply = self
            .execute_with_retry("SET", |mut conn| {
                let key = key.to_string();
                let value = value.to_string();
                Box::pin(async move {
                    redis::cmd("SET")
                        .arg(key)
                        .arg(value)
                        .arg("EX")
                        .arg(expiry_seconds)
                        .arg("NX")
                        .query_async::<_, Option<String>>(&mut conn)
                        .await
                })
            })
            .await
            .map_err(|e| {
                error!("Failed to set key '{}' if absent: {}", key, e);
                InfrastructureError::Cache(e)
            })?;

        Ok(reply.is_some())
    }

    /// Get a value from cache, `None` if not found
    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        debug!("Getting key '{}'", key);

        let value = self
            .execute_with_retry("GET", |mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.get::<_, Option<String>>(key).await })
            })
            .await
            .map_err(|e| {
                error!("Failed to get key '{}': {}", key, e);
                InfrastructureError::Cache(e)
            })?;

        if value.is_none() {
            debug!("Key '{}' not found", key);
        }
        Ok(value)
    }

    /// Delete a key, returning whether it existed
    ///
    /// `DEL` reports the number of removed keys, so two concurrent deletes of
    /// the same key see exactly one `true`. Never retried.
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!("Deleting key '{}'", key);

        let deleted_count = self
            .execute_with_retry("DEL", |mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await
            .map_err(|e| {
                error!("Failed to delete key '{}': {}", key, e);
                InfrastructureError::Cache(e)
            })?;

        Ok(deleted_count > 0)
    }

    /// Check if a key exists
    pub async fn exists(&self, key: &str) -> Result<bool, InfrastructureError> {
        self.execute_with_retry("EXISTS", |mut conn| {
            let key = key.to_string();
            Box::pin(async move { conn.exists::<_, bool>(key).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to check key '{}' existence: {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Increment a counter, returning the new value. Never retried.
    pub async fn increment(&self, key: &str) -> Result<i64, InfrastructureError> {
        debug!("Incrementing counter '{}'", key);

        self.execute_with_retry("INCR", |mut conn| {
            let key = key.to_string();
            Box::pin(async move { conn.incr::<_, _, i64>(key, 1).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to increment counter '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Set a time-to-live on an existing key
    pub async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<(), InfrastructureError> {
        self.execute_with_retry("EXPIRE", |mut conn| {
            let key = key.to_string();
            Box::pin(async move { conn.expire::<_, ()>(key, ttl_seconds as i64).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to set expiry on key '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Get time-to-live for a key
    ///
    /// # Returns
    /// * `Ok(None)` - The key does not exist or has no expiry
    pub async fn ttl(&self, key: &str) -> Result<Option<u64>, InfrastructureError> {
        let ttl = self
            .execute_with_retry("TTL", |mut conn| {
                let key = key.to_string();
                Box::pin(async move { conn.ttl::<_, i64>(key).await })
            })
            .await
            .map_err(|e| {
                error!("Failed to get TTL for key '{}': {}", key, e);
                InfrastructureError::Cache(e)
            })?;

        // -2: missing key, -1: no expiry
        Ok(u64::try_from(ttl).ok())
    }

    /// Check if the Redis connection is healthy with a PING
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        debug!("Performing Redis health check");

        let response = self
            .execute_with_retry("PING", |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await
            .map_err(|e| {
                error!("Redis health check failed: {}", e);
                InfrastructureError::Cache(e)
            })?;

        if response == "PONG" {
            Ok(true)
        } else {
            warn!("Redis health check returned unexpected response: {}", response);
            Ok(false)
        }
    }

    /// Execute a Redis operation, retrying transient failures with backoff
    ///
    /// Commands that are not idempotent run once and surface their error.
    async fn execute_with_retry<F, T>(&self, command: &'static str, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            match operation(conn).await {
                Ok(result) => return Ok(result),
                Err(e) if attempts < self.max_retries && is_idempotent(command) && is_retriable_error(&e) => {
                    warn!(
                        "Redis {} failed (attempt {}/{}): {}. Retrying in {}ms...",
                        command, attempts, self.max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(5000);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl CacheServiceTrait for RedisClient {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), String> {
        self.set_with_expiry(key, value, ttl_secs).await.map_err(|e| e.to_string())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, String> {
        self.set_nx_with_expiry(key, value, ttl_secs).await.map_err(|e| e.to_string())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        RedisClient::get(self, key).await.map_err(|e| e.to_string())
    }

    async fn delete(&self, key: &str) -> Result<bool, String> {
        RedisClient::delete(self, key).await.map_err(|e| e.to_string())
    }

    async fn exists(&self, key: &str) -> Result<bool, String> {
        RedisClient::exists(self, key).await.map_err(|e| e.to_string())
    }

    async fn increment(&self, key: &str) -> Result<i64, String> {
        RedisClient::increment(self, key).await.map_err(|e| e.to_string())
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), String> {
        RedisClient::expire(self, key, ttl_secs).await.map_err(|e| e.to_string())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, String> {
        RedisClient::ttl(self, key).await.map_err(|e| e.to_string())
    }
}

/// Whether an error is transient and the operation should be retried
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Whether resending a command after a lost reply leaves the same outcome
///
/// A resent `DEL` reports `false` to the caller whose first attempt deleted
/// the key, and a resent `INCR` counts twice.
pub(crate) fn is_idempotent(command: &str) -> bool {
    !matches!(command, "DEL" | "INCR")
}

/// Mask credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let (Some(at_pos), Some(proto_end)) = (url.find('@'), url.find("://")) {
        if proto_end < at_pos {
            return format!("{}****{}", &url[..proto_end + 3], &url[at_pos..]);
        }
    }
    url.to_string()
}
