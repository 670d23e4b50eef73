//! One-time password module for account activation
//!
//! This module provides the OTP workflow end to end:
//! - Code generation with per-target rate limiting
//! - Volatile cache storage mirrored into a durable record store
//! - Cache-first verification with durable fallback
//! - At-most-once consumption and account activation
//! - Periodic reclaim of used and expired records

mod activation;
mod cleanup;
mod clock;
mod config;
mod rate_limiter;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use activation::AccountActivator;
pub use cleanup::{OtpCleanupConfig, OtpCleanupService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OtpServiceConfig;
pub use rate_limiter::CacheRateLimiter;
pub use service::{otp_cache_key, OtpService};
pub use traits::{CacheServiceTrait, OtpDeliveryTrait, RateLimiterTrait};
pub use types::{IssuedOtp, VerificationPath, VerifiedOtp};
