//! Types for OTP service results

use chrono::{DateTime, Utc};

use crate::domain::entities::{Account, TargetType};

/// Result of issuing a code
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    /// The generated code
    pub code: String,
    /// Normalized target the code was issued against
    pub target: String,
    pub target_type: TargetType,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Seconds until expiry
    pub expires_in_seconds: u64,
    /// Seconds until the same target may request another code
    pub resend_after_seconds: u64,
}

/// Which store confirmed the code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPath {
    /// The cache held the code
    Cache,
    /// Cache miss, matched a durable record
    Durable,
}

/// Result of a successful verification
#[derive(Debug, Clone)]
pub struct VerifiedOtp {
    /// The activated account
    pub account: Account,
    pub path: VerificationPath,
}
