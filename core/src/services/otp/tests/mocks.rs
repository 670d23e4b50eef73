//! Mock implementations for testing the OTP service

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::entities::{Account, OtpRecord, TargetType};
use crate::errors::DomainError;
use crate::repositories::{AccountRepository, InMemoryAccountRepository, InMemoryOtpRecordRepository, OtpRecordRepository};
use crate::services::otp::traits::CacheServiceTrait;
use crate::services::otp::{AccountActivator, CacheRateLimiter, Clock, ManualClock, OtpService, OtpServiceConfig};

// Mock cache honoring TTLs against an injected clock
pub struct MockCacheService {
    pub entries: Arc<Mutex<HashMap<String, (String, Option<DateTime<Utc>>)>>>,
    clock: Arc<dyn Clock>,
    should_fail: AtomicBool,
    fail_deletes: AtomicBool,
    fail_expires: AtomicBool,
    latency: Mutex<Option<std::time::Duration>>,
}

impl MockCacheService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            should_fail: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_expires: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_failing_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_failing_expires(&self, fail: bool) {
        self.fail_expires.store(fail, Ordering::SeqCst);
    }

    /// Write a key with no expiry, ignoring the failure flags
    pub fn seed_persistent(&self, key: &str, value: &str) {
        self.entries.lock().unwrap().insert(key.to_string(), (value.to_string(), None));
    }

    pub fn set_latency(&self, latency: std::time::Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Live value of a key, ignoring the failure flag
    pub fn peek(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .filter(|(_, expires_at)| expires_at.map_or(true, |at| now < at))
            .map(|(value, _)| value.clone())
    }

    /// Remaining TTL of a key in seconds, ignoring the failure flag
    pub fn peek_ttl(&self, key: &str) -> Option<i64> {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .and_then(|(_, expires_at)| *expires_at)
            .map(|at| (at - now).num_seconds())
    }

    /// Simulate eviction
    pub fn evict(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    async fn check(&self) -> Result<(), String> {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err("Cache service error".to_string());
        }
        Ok(())
    }

    fn purge_expired(&self, entries: &mut HashMap<String, (String, Option<DateTime<Utc>>)>) {
        let now = self.clock.now();
        entries.retain(|_, (_, expires_at)| expires_at.map_or(true, |at| now < at));
    }
}

#[async_trait]
impl CacheServiceTrait for MockCacheService {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), String> {
        self.check().await?;
        let expires_at = self.clock.now() + Duration::seconds(ttl_secs as i64);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Some(expires_at)));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, String> {
        self.check().await?;
        let mut entries = self.entries.lock().unwrap();
        self.purge_expired(&mut entries);
        if entries.contains_key(key) {
            return Ok(false);
        }
        let expires_at = self.clock.now() + Duration::seconds(ttl_secs as i64);
        entries.insert(key.to_string(), (value.to_string(), Some(expires_at)));
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.check().await?;
        let mut entries = self.entries.lock().unwrap();
        self.purge_expired(&mut entries);
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, String> {
        self.check().await?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err("Cache delete error".to_string());
        }
        let mut entries = self.entries.lock().unwrap();
        self.purge_expired(&mut entries);
        Ok(entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, String> {
        Ok(self.get(key).await?.is_some())
    }

    async fn increment(&self, key: &str) -> Result<i64, String> {
        self.check().await?;
        let mut entries = self.entries.lock().unwrap();
        self.purge_expired(&mut entries);
        let entry = entries.entry(key.to_string()).or_insert_with(|| ("0".to_string(), None));
        let next = entry.0.parse::<i64>().map_err(|e| e.to_string())? + 1;
        entry.0 = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), String> {
        self.check().await?;
        if self.fail_expires.load(Ordering::SeqCst) {
            return Err("Cache expire error".to_string());
        }
        let expires_at = self.clock.now() + Duration::seconds(ttl_secs as i64);
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.1 = Some(expires_at);
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, String> {
        self.check().await?;
        Ok(self.peek_ttl(key).map(|secs| secs.max(0) as u64))
    }
}

// Durable store wrapper with a failure switch
#[derive(Default)]
pub struct MockOtpRecordRepository {
    pub inner: InMemoryOtpRecordRepository,
    should_fail: AtomicBool,
}

impl MockOtpRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::Internal {
                message: "Database error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OtpRecordRepository for MockOtpRecordRepository {
    async fn insert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn find_valid(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        self.check()?;
        self.inner.find_valid(target, target_type, code, now).await
    }

    async fn find_expired_match(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        self.check()?;
        self.inner.find_expired_match(target, target_type, code, now).await
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, DomainError> {
        self.check()?;
        self.inner.mark_used(id).await
    }

    async fn retire_outstanding(
        &self,
        target: &str,
        target_type: TargetType,
        keep: Option<Uuid>,
    ) -> Result<u64, DomainError> {
        self.check()?;
        self.inner.retire_outstanding(target, target_type, keep).await
    }

    async fn delete_reclaimable(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        self.check()?;
        self.inner.delete_reclaimable(now).await
    }
}

// Account store that cannot save
pub struct FailingAccountRepository {
    pub inner: InMemoryAccountRepository,
}

#[async_trait]
impl AccountRepository for FailingAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_contact(&self, contact: &str) -> Result<Option<Account>, DomainError> {
        self.inner.find_by_contact(contact).await
    }

    async fn set_active_and_save(&self, _account: Account) -> Result<Account, DomainError> {
        Err(DomainError::Internal {
            message: "Database error".to_string(),
        })
    }
}

pub type TestOtpService =
    OtpService<MockCacheService, CacheRateLimiter<MockCacheService>, MockOtpRecordRepository>;

/// Fully wired service over mocks sharing one manual clock
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MockCacheService>,
    pub limiter_cache: Arc<MockCacheService>,
    pub records: Arc<MockOtpRecordRepository>,
    pub gym_owners: Arc<InMemoryAccountRepository>,
    pub trainers: Arc<InMemoryAccountRepository>,
    pub customers: Arc<InMemoryAccountRepository>,
    pub service: TestOtpService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(OtpServiceConfig::default())
    }

    /// Service returning the fixed development code `123456`
    pub fn with_override() -> Self {
        Self::with_config(OtpServiceConfig {
            default_code: Some("123456".to_string()),
            ..Default::default()
        })
    }

    pub fn with_config(config: OtpServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::default());
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let cache = Arc::new(MockCacheService::new(dyn_clock.clone()));
        let limiter_cache = Arc::new(MockCacheService::new(dyn_clock.clone()));
        let rate_limiter = Arc::new(CacheRateLimiter::new(
            limiter_cache.clone(),
            config.key_namespace.clone(),
            config.rate_limit_window_seconds,
            1,
        ));
        let records = Arc::new(MockOtpRecordRepository::new());

        let gym_owners = Arc::new(InMemoryAccountRepository::new());
        let trainers = Arc::new(InMemoryAccountRepository::new());
        let customers = Arc::new(InMemoryAccountRepository::new());
        let activator = AccountActivator::new(gym_owners.clone(), trainers.clone(), customers.clone());

        let service = OtpService::new(cache.clone(), rate_limiter, records.clone(), activator, config)
            .with_clock(dyn_clock);

        Self {
            clock,
            cache,
            limiter_cache,
            records,
            gym_owners,
            trainers,
            customers,
            service,
        }
    }

    /// Register an inactive customer reachable by phone
    pub async fn customer(&self, phone: &str) -> Account {
        let account = Account::new(TargetType::Customer, "Jamie Rivera").with_phone(phone);
        self.customers.insert(account.clone()).await;
        account
    }
}
