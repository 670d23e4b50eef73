//! Main OTP service implementation

use chrono::Duration;
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use uuid::Uuid;

use gym_shared::contact::{self, mask_contact};

use crate::domain::entities::{OtpRecord, TargetType};
use crate::errors::OtpError;
use crate::repositories::OtpRecordRepository;

use super::activation::AccountActivator;
use super::clock::{Clock, SystemClock};
use super::config::OtpServiceConfig;
use super::traits::{CacheServiceTrait, RateLimiterTrait};
use super::types::{IssuedOtp, VerificationPath, VerifiedOtp};

/// Cache key holding the live code, e.g. `otp:customer:+15551234567`
pub fn otp_cache_key(namespace: &str, target_type: TargetType, target: &str) -> String {
    format!("{}:{}:{}", namespace, target_type, target)
}

/// OTP issuance and verification engine
///
/// The cache is authoritative while it holds a code; the durable store is the
/// fallback once the entry is gone and the tie-break when two verifications
/// race for the same code.
pub struct OtpService<C, L, R>
where
    C: CacheServiceTrait + ?Sized,
    L: RateLimiterTrait + ?Sized,
    R: OtpRecordRepository + ?Sized,
{
    /// Volatile store for live codes
    cache: Arc<C>,
    /// Per-target issuance limiter
    rate_limiter: Arc<L>,
    /// Durable record store
    records: Arc<R>,
    /// Activation side effect
    activator: AccountActivator,
    clock: Arc<dyn Clock>,
    /// Service configuration
    config: OtpServiceConfig,
}

impl<C, L, R> OtpService<C, L, R>
where
    C: CacheServiceTrait + ?Sized,
    L: RateLimiterTrait + ?Sized,
    R: OtpRecordRepository + ?Sized,
{
    /// Create a new OTP service
    ///
    /// # Arguments
    ///
    /// * `cache` - Cache holding live codes
    /// * `rate_limiter` - Issuance limiter, ideally over its own cache handle
    /// * `records` - Durable record store
    /// * `activator` - Account activation dispatcher
    /// * `config` - Service configuration
    pub fn new(
        cache: Arc<C>,
        rate_limiter: Arc<L>,
        records: Arc<R>,
        activator: AccountActivator,
        config: OtpServiceConfig,
    ) -> Self {
        Self {
            cache,
            rate_limiter,
            records,
            activator,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OtpServiceConfig {
        &self.config
    }

    fn cache_key(&self, target_type: TargetType, target: &str) -> String {
        otp_cache_key(&self.config.key_namespace, target_type, target)
    }

    /// Issue a code for a target
    ///
    /// This method:
    /// 1. Validates the target
    /// 2. Checks the rate limiter
    /// 3. Generates the code (or uses the development override)
    /// 4. Stores the code in cache with the expiry TTL
    /// 5. Records the issuance against the rate limit
    /// 6. Mirrors the code into the durable store and retires older rows (best effort)
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedOtp)` - The code and its expiry metadata
    /// * `Err(OtpError::RateLimitExceeded)` - A code was issued too recently
    /// * `Err(OtpError::StorageUnavailable)` - The cache write failed
    pub async fn generate_otp(&self, target: &str, target_type: TargetType) -> Result<IssuedOtp, OtpError> {
        let target = normalize_target(target)?;
        let masked = mask_contact(&target);

        if !self.rate_limiter.is_allowed(&target).await {
            let retry_after_seconds = self
                .rate_limiter
                .retry_after(&target)
                .await
                .unwrap_or(self.config.rate_limit_window_seconds);
            tracing::warn!(
                target_contact = %masked,
                target_type = %target_type,
                retry_after = retry_after_seconds,
                event = "rate_limit_exceeded",
                "OTP request rate limit exceeded"
            );
            return Err(OtpError::RateLimitExceeded { retry_after_seconds });
        }

        let code = self.generate_code();
        let now = self.clock.now();
        let key = self.cache_key(target_type, &target);

        self.cache
            .set(&key, &code, self.config.expiry_seconds)
            .await
            .map_err(|e| {
                tracing::error!(
                    target_contact = %masked,
                    error = %e,
                    event = "otp_storage_failed",
                    "Failed to store OTP in cache"
                );
                OtpError::storage("cache_set", e)
            })?;

        self.rate_limiter.increment(&target).await;

        let record = OtpRecord::new(
            target.clone(),
            target_type,
            code.clone(),
            now,
            Duration::seconds(self.config.expiry_seconds as i64),
        );

        if self.config.durable_records {
            match self.records.insert(&record).await {
                Ok(()) => self.retire_outstanding(&target, target_type, Some(record.id), &masked).await,
                Err(e) => {
                    tracing::warn!(
                        target_contact = %masked,
                        error = %e,
                        event = "otp_record_insert_failed",
                        "Failed to mirror OTP into durable store"
                    );
                }
            }
        }

        tracing::info!(
            target_contact = %masked,
            target_type = %target_type,
            record_id = %record.id,
            event = "otp_generated",
            "Generated new OTP"
        );

        Ok(IssuedOtp {
            code,
            target,
            target_type,
            expires_at: record.expires_at,
            expires_in_seconds: self.config.expiry_seconds,
            resend_after_seconds: self.config.rate_limit_window_seconds,
        })
    }

    /// Verify a submitted code and activate the account behind the target
    ///
    /// Succeeds at most once per issued code. A second call with the same code
    /// fails with `InvalidOtp`.
    pub async fn verify_otp(
        &self,
        target: &str,
        target_type: TargetType,
        submitted_code: &str,
    ) -> Result<VerifiedOtp, OtpError> {
        let target = normalize_target(target)?;
        let code = submitted_code.trim();
        if code.is_empty() {
            return Err(OtpError::InvalidInput {
                field: "otp".to_string(),
            });
        }
        if code.len() != self.config.code_length || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(OtpError::InvalidOtp);
        }

        let masked = mask_contact(&target);
        let key = self.cache_key(target_type, &target);

        let (cached, cache_read_failed) = match self.cache.get(&key).await {
            Ok(value) => (value, false),
            Err(e) => {
                tracing::warn!(
                    target_contact = %masked,
                    error = %e,
                    event = "otp_cache_read_failed",
                    "Cache read failed, falling back to durable store"
                );
                (None, true)
            }
        };

        let path = match cached {
            Some(stored) => {
                if !constant_time_eq(stored.as_bytes(), code.as_bytes()) {
                    tracing::info!(
                        target_contact = %masked,
                        target_type = %target_type,
                        event = "otp_mismatch",
                        "Submitted OTP does not match"
                    );
                    return Err(OtpError::InvalidOtp);
                }
                self.consume_cached(&key, &target, target_type, code).await?;
                VerificationPath::Cache
            }
            None => {
                let record = self.find_durable_match(&target, target_type, code).await?;
                self.claim_record(&record, &masked).await?;
                if cache_read_failed {
                    self.delete_cache_entry(&key, &masked).await;
                }
                VerificationPath::Durable
            }
        };

        if self.config.durable_records {
            self.retire_outstanding(&target, target_type, None, &masked).await;
        }

        let account = self.activator.activate(&target, target_type).await.map_err(|e| {
            tracing::error!(
                target_contact = %masked,
                target_type = %target_type,
                error = %e,
                event = "otp_activation_failed",
                "OTP verified but account activation failed"
            );
            e
        })?;

        tracing::info!(
            target_contact = %masked,
            target_type = %target_type,
            path = ?path,
            event = "otp_verified",
            "OTP verified"
        );

        Ok(VerifiedOtp { account, path })
    }

    /// `generate_otp` bounded by a deadline
    pub async fn generate_otp_within(
        &self,
        deadline: std::time::Duration,
        target: &str,
        target_type: TargetType,
    ) -> Result<IssuedOtp, OtpError> {
        tokio::time::timeout(deadline, self.generate_otp(target, target_type))
            .await
            .map_err(|_| OtpError::DeadlineExceeded {
                operation: "generate_otp".to_string(),
            })?
    }

    /// `verify_otp` bounded by a deadline
    ///
    /// A cache write completed before the deadline is kept, so the caller may
    /// retry verification safely.
    pub async fn verify_otp_within(
        &self,
        deadline: std::time::Duration,
        target: &str,
        target_type: TargetType,
        submitted_code: &str,
    ) -> Result<VerifiedOtp, OtpError> {
        tokio::time::timeout(deadline, self.verify_otp(target, target_type, submitted_code))
            .await
            .map_err(|_| OtpError::DeadlineExceeded {
                operation: "verify_otp".to_string(),
            })?
    }

    /// Fast-path consumption after a cache hit
    ///
    /// The durable record is looked up before the cache entry is deleted so a
    /// concurrent caller that misses the cache afterwards cannot consume the
    /// same code through the durable path unnoticed. When the delete fails the
    /// conditional durable update decides the winner.
    async fn consume_cached(
        &self,
        key: &str,
        target: &str,
        target_type: TargetType,
        code: &str,
    ) -> Result<(), OtpError> {
        let masked = mask_contact(target);

        let record = if self.config.durable_records {
            match self.records.find_valid(target, target_type, code, self.clock.now()).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        target_contact = %masked,
                        error = %e,
                        event = "otp_record_lookup_failed",
                        "Durable lookup failed during consumption"
                    );
                    None
                }
            }
        } else {
            None
        };

        let delete_error = match self.cache.delete(key).await {
            Ok(true) => None,
            Ok(false) => {
                tracing::info!(
                    target_contact = %masked,
                    event = "otp_already_consumed",
                    "OTP consumed by a concurrent request"
                );
                return Err(OtpError::InvalidOtp);
            }
            Err(e) => {
                tracing::warn!(
                    target_contact = %masked,
                    error = %e,
                    event = "otp_cache_delete_failed",
                    "Cache delete failed, deferring to durable record"
                );
                Some(e)
            }
        };

        match (record, delete_error) {
            (Some(record), _) => self.claim_record(&record, &masked).await,
            (None, None) => Ok(()),
            // Neither store can prove this caller consumed the code
            (None, Some(e)) => Err(OtpError::storage("cache_delete", e)),
        }
    }

    /// Conditionally mark a durable record used; losing the update means another caller consumed it
    async fn claim_record(&self, record: &OtpRecord, masked: &str) -> Result<(), OtpError> {
        match self.records.mark_used(record.id).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::info!(
                    target_contact = %masked,
                    record_id = %record.id,
                    event = "otp_already_consumed",
                    "OTP record already used"
                );
                Err(OtpError::InvalidOtp)
            }
            Err(e) => {
                tracing::warn!(
                    target_contact = %masked,
                    record_id = %record.id,
                    error = %e,
                    event = "otp_mark_used_failed",
                    "Failed to mark OTP record used"
                );
                Ok(())
            }
        }
    }

    /// Durable fallback after a cache miss
    async fn find_durable_match(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
    ) -> Result<OtpRecord, OtpError> {
        if !self.config.durable_records {
            return Err(OtpError::InvalidOtp);
        }

        let now = self.clock.now();
        let masked = mask_contact(target);

        if let Some(record) = self
            .records
            .find_valid(target, target_type, code, now)
            .await
            .map_err(|e| OtpError::storage("durable_find_valid", e))?
        {
            return Ok(record);
        }

        let expired = self
            .records
            .find_expired_match(target, target_type, code, now)
            .await
            .map_err(|e| OtpError::storage("durable_find_expired", e))?;

        if expired.is_some() {
            tracing::info!(
                target_contact = %masked,
                target_type = %target_type,
                event = "otp_expired",
                "Submitted OTP has expired"
            );
            Err(OtpError::OtpExpired)
        } else {
            tracing::info!(
                target_contact = %masked,
                target_type = %target_type,
                event = "otp_no_match",
                "No live OTP matches submission"
            );
            Err(OtpError::InvalidOtp)
        }
    }

    /// Best-effort close-out of older durable rows for the target
    async fn retire_outstanding(&self, target: &str, target_type: TargetType, keep: Option<Uuid>, masked: &str) {
        match self.records.retire_outstanding(target, target_type, keep).await {
            Ok(0) => {}
            Ok(retired) => {
                tracing::debug!(
                    target_contact = %masked,
                    retired,
                    event = "otp_records_retired",
                    "Retired outstanding OTP records"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target_contact = %masked,
                    error = %e,
                    event = "otp_record_retire_failed",
                    "Failed to retire outstanding OTP records"
                );
            }
        }
    }

    async fn delete_cache_entry(&self, key: &str, masked: &str) {
        if let Err(e) = self.cache.delete(key).await {
            tracing::warn!(
                target_contact = %masked,
                error = %e,
                event = "otp_cache_delete_failed",
                "Failed to delete OTP from cache"
            );
        }
    }

    /// Override code when configured, otherwise uniform random digits
    fn generate_code(&self) -> String {
        if let Some(code) = &self.config.default_code {
            return code.clone();
        }

        let mut rng = OsRng;
        (0..self.config.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

fn normalize_target(target: &str) -> Result<String, OtpError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(OtpError::InvalidInput {
            field: "target".to_string(),
        });
    }
    Ok(contact::normalize(trimmed))
}
