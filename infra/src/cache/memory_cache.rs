//! In-process cache with per-key expiry
//!
//! Used when `CACHE_TYPE=memory` and by integration tests. Expiry is checked
//! lazily against `tokio::time::Instant`, so paused test clocks apply.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use gym_core::CacheServiceTrait;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory `CacheServiceTrait` implementation
///
/// Every operation holds the write lock for its whole read-modify-write, which
/// gives the same per-command atomicity Redis provides.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired keys, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

#[async_trait]
impl CacheServiceTrait for MemoryCache {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), String> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, String> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.get(key).map_or(false, |entry| entry.is_live(now)) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, String> {
        let now = Instant::now();
        Ok(self
            .entries
            .write()
            .await
            .remove(key)
            .map_or(false, |entry| entry.is_live(now)))
    }

    async fn exists(&self, key: &str) -> Result<bool, String> {
        Ok(CacheServiceTrait::get(self, key).await?.is_some())
    }

    async fn increment(&self, key: &str) -> Result<i64, String> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let entry = entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if !entry.is_live(now) {
                    *entry = Entry {
                        value: "0".to_string(),
                        expires_at: None,
                    };
                }
            })
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: None,
            });

        let next = entry
            .value
            .parse::<i64>()
            .map_err(|_| format!("Value at '{}' is not an integer", key))?
            + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), String> {
        let now = Instant::now();
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            if entry.is_live(now) {
                entry.expires_at = Some(now + Duration::from_secs(ttl_secs));
            }
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, String> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now).as_secs()))
    }
}
