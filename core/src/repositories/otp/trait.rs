//! Durable OTP record store interface.
//!
//! Records are insert-only: a new issuance always inserts a fresh row and the
//! only in-place change is the `used` flag. Issuing a code retires the older
//! rows for the same target, and so does a successful verification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpRecord, TargetType};
use crate::errors::DomainError;

/// Repository trait for OTP record persistence operations
#[async_trait]
pub trait OtpRecordRepository: Send + Sync {
    /// Persist a newly issued record
    async fn insert(&self, record: &OtpRecord) -> Result<(), DomainError>;

    /// Find an unused record matching the code that is still valid at `now`
    ///
    /// # Returns
    /// * `Ok(Some(OtpRecord))` - A live record matched
    /// * `Ok(None)` - No unused, unexpired record with this code
    async fn find_valid(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError>;

    /// Find an unused record matching the code whose expiry passed before `now`
    async fn find_expired_match(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError>;

    /// Atomically flip `used` from false to true
    ///
    /// # Returns
    /// * `Ok(true)` - This call consumed the record
    /// * `Ok(false)` - The record was already used (or does not exist)
    async fn mark_used(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Mark every unused record for the target used, except `keep`
    ///
    /// Closes out superseded codes so at most one stays redeemable. Returns
    /// how many rows were flipped.
    async fn retire_outstanding(
        &self,
        target: &str,
        target_type: TargetType,
        keep: Option<Uuid>,
    ) -> Result<u64, DomainError>;

    /// Delete rows that are used or expired at `now`, returning how many were removed
    async fn delete_reclaimable(&self, now: DateTime<Utc>) -> Result<u64, DomainError>;
}
