//! One-time password configuration module

use serde::{Deserialize, Serialize};

use super::{env_parse, ConfigError, Environment};

/// Longest code the issuer will generate
pub const MAX_CODE_LENGTH: usize = 12;

/// OTP issuance and verification policy
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct OtpConfig {
    /// Number of digits in a generated code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds a code stays valid after issuance
    #[serde(default = "default_expiry_seconds")]
    pub expiry_seconds: u64,

    /// Cooldown window for re-issuance to the same target, in seconds
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_seconds: u64,

    /// Issuances allowed per target within one window
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Fixed code returned instead of a random one (development only)
    #[serde(default)]
    pub default_code: Option<String>,

    /// Return the issued code in the send response (development only)
    #[serde(default)]
    pub echo_code: bool,

    /// Namespace prefix for every cache key
    #[serde(default = "default_key_namespace")]
    pub key_namespace: String,

    /// Mirror every issued code into the durable record store
    #[serde(default = "default_durable_records")]
    pub durable_records: bool,

    /// Interval of the reclaim sweep in seconds (0 disables it)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            expiry_seconds: default_expiry_seconds(),
            rate_limit_window_seconds: default_rate_limit_window(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            default_code: None,
            echo_code: false,
            key_namespace: default_key_namespace(),
            durable_records: default_durable_records(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_code = std::env::var("OTP_DEFAULT_CODE")
            .ok()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        Ok(Self {
            code_length: env_parse("OTP_LENGTH", default_code_length())?,
            expiry_seconds: env_parse("OTP_EXPIRY_SECONDS", default_expiry_seconds())?,
            rate_limit_window_seconds: env_parse(
                "OTP_RATE_LIMIT_WINDOW_SECONDS",
                default_rate_limit_window(),
            )?,
            rate_limit_max_requests: env_parse(
                "OTP_RATE_LIMIT_MAX_REQUESTS",
                default_rate_limit_max_requests(),
            )?,
            default_code,
            echo_code: env_parse("OTP_ECHO_CODE", false)?,
            key_namespace: std::env::var("OTP_KEY_NAMESPACE")
                .unwrap_or_else(|_| default_key_namespace()),
            durable_records: env_parse("OTP_DURABLE_RECORDS", default_durable_records())?,
            cleanup_interval_seconds: env_parse(
                "OTP_CLEANUP_INTERVAL_SECONDS",
                default_cleanup_interval(),
            )?,
        })
    }

    /// Set a fixed override code
    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        self.default_code = Some(code.into());
        self
    }

    /// Validate the policy for the given environment
    pub fn validate(&self, environment: Environment) -> Result<(), ConfigError> {
        if self.code_length == 0 || self.code_length > MAX_CODE_LENGTH {
            return Err(ConfigError::InvalidValue {
                key: "OTP_LENGTH".to_string(),
                message: format!("must be between 1 and {}", MAX_CODE_LENGTH),
            });
        }
        if self.expiry_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OTP_EXPIRY_SECONDS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.rate_limit_window_seconds == 0 || self.rate_limit_max_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OTP_RATE_LIMIT_WINDOW_SECONDS".to_string(),
                message: "window and max requests must be greater than zero".to_string(),
            });
        }
        if self.key_namespace.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "OTP_KEY_NAMESPACE".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.echo_code && environment.is_production() {
            return Err(ConfigError::ForbiddenInEnvironment {
                key: "OTP_ECHO_CODE".to_string(),
                environment,
            });
        }
        if let Some(code) = &self.default_code {
            if environment.is_production() {
                return Err(ConfigError::ForbiddenInEnvironment {
                    key: "OTP_DEFAULT_CODE".to_string(),
                    environment,
                });
            }
            if code.len() != self.code_length || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::InvalidValue {
                    key: "OTP_DEFAULT_CODE".to_string(),
                    message: format!("must be exactly {} digits", self.code_length),
                });
            }
        }
        Ok(())
    }
}

fn default_code_length() -> usize {
    6
}

fn default_expiry_seconds() -> u64 {
    300 // 5 minutes
}

fn default_rate_limit_window() -> u64 {
    60
}

fn default_rate_limit_max_requests() -> u32 {
    1
}

fn default_key_namespace() -> String {
    String::from("otp")
}

fn default_durable_records() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600
}
