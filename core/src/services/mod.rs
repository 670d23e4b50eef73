//! Business services containing domain logic and use cases.

pub mod otp;

// Re-export commonly used types
pub use otp::{
    otp_cache_key, AccountActivator, CacheRateLimiter, CacheServiceTrait, Clock, IssuedOtp, ManualClock,
    OtpCleanupConfig, OtpCleanupService, OtpDeliveryTrait, OtpService, OtpServiceConfig,
    RateLimiterTrait, SystemClock, VerificationPath, VerifiedOtp,
};
