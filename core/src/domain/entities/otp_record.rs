//! Durable one-time password record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of a generated code unless configured otherwise
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default validity of a code (5 minutes)
pub const DEFAULT_EXPIRATION_SECONDS: i64 = 300;

/// Account class an OTP applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Owner of a gym tenant
    GymOwner,
    /// Trainer employed by a gym
    Trainer,
    /// Gym member
    Customer,
}

impl TargetType {
    /// Wire and cache-key representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::GymOwner => "gym_owner",
            TargetType::Trainer => "trainer",
            TargetType::Customer => "customer",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gym_owner" | "gymowner" | "owner" => Ok(TargetType::GymOwner),
            "trainer" => Ok(TargetType::Trainer),
            "customer" => Ok(TargetType::Customer),
            _ => Err(format!("Invalid target type: {}", s)),
        }
    }
}

/// Persistent copy of an issued code, retained as audit trail and
/// verification fallback when the cache entry is gone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Unique identifier, assigned at creation
    pub id: Uuid,

    /// Contact address or account id the code was issued against
    pub target: String,

    /// Account class of the target
    pub target_type: TargetType,

    /// The fixed-length digit code
    pub code: String,

    /// Set exactly once, on successful verification
    pub used: bool,

    /// The code is invalid at or after this instant
    pub expires_at: DateTime<Utc>,

    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Creates an unused record issued at `now` and valid for `ttl`
    pub fn new(
        target: impl Into<String>,
        target_type: TargetType,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            target_type,
            code: code.into(),
            used: false,
            expires_at: now + ttl,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the code has expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks whether the record can still be consumed at the given instant
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired_at(now)
    }

    /// Checks whether the record is eligible for the reclaim sweep
    pub fn is_reclaimable_at(&self, now: DateTime<Utc>) -> bool {
        self.used || self.is_expired_at(now)
    }

    /// Marks the record as consumed
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.used = true;
        self.updated_at = now;
    }

    /// Whole seconds until expiry, zero once expired
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}
