//! Cache configuration module

use serde::{Deserialize, Serialize};

/// Cache backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Backend used for OTP codes and rate-limit counters
    #[serde(default = "default_cache_type")]
    pub cache_type: CacheType,

    /// Redis connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Maximum retry attempts for a single Redis command
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Cache type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    Redis,
    Memory,
}

impl std::str::FromStr for CacheType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(CacheType::Redis),
            "memory" | "mem" => Ok(CacheType::Memory),
            _ => Err(format!("Invalid cache type: {}", s)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            url: String::from("redis://localhost:6379"),
            max_connections: 10,
            connection_timeout: 5,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let cache_type = std::env::var("CACHE_TYPE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(default_cache_type);
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let max_connections = std::env::var("REDIS_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Self {
            cache_type,
            url,
            max_connections,
            ..Default::default()
        }
    }

    /// Create a new Redis cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Create an in-process memory cache configuration
    pub fn memory() -> Self {
        Self {
            cache_type: CacheType::Memory,
            ..Default::default()
        }
    }
}

fn default_cache_type() -> CacheType {
    CacheType::Redis
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.cache_type, CacheType::Redis);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("redis".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert_eq!("Memory".parse::<CacheType>().unwrap(), CacheType::Memory);
        assert!("memcached".parse::<CacheType>().is_err());
    }

    #[test]
    fn test_memory_config() {
        assert_eq!(CacheConfig::memory().cache_type, CacheType::Memory);
    }
}
