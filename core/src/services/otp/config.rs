//! Configuration for the OTP service

use gym_shared::config::OtpConfig;

use crate::domain::entities::otp_record::{DEFAULT_CODE_LENGTH, DEFAULT_EXPIRATION_SECONDS};

/// Configuration for the OTP service
#[derive(Debug, Clone)]
pub struct OtpServiceConfig {
    /// Number of digits in a generated code
    pub code_length: usize,
    /// Seconds before a code expires
    pub expiry_seconds: u64,
    /// Minimum seconds between issuances for the same target
    pub rate_limit_window_seconds: u64,
    /// Fixed code returned instead of a random one (development only)
    pub default_code: Option<String>,
    /// Prefix of every cache key
    pub key_namespace: String,
    /// Whether issued codes are mirrored into the durable store
    pub durable_records: bool,
}

impl Default for OtpServiceConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            expiry_seconds: DEFAULT_EXPIRATION_SECONDS as u64,
            rate_limit_window_seconds: 60,
            default_code: None,
            key_namespace: "otp".to_string(),
            durable_records: true,
        }
    }
}

impl From<&OtpConfig> for OtpServiceConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            code_length: config.code_length,
            expiry_seconds: config.expiry_seconds,
            rate_limit_window_seconds: config.rate_limit_window_seconds,
            default_code: config.default_code.clone(),
            key_namespace: config.key_namespace.clone(),
            durable_records: config.durable_records,
        }
    }
}
