//! Failure kinds surfaced by OTP issuance and verification

use gym_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Errors returned by the OTP engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    /// A prior code for the same target is still within its cooldown window
    #[error("Too many requests. Please try again in {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// The submitted code matches no live code for the target
    #[error("Invalid verification code")]
    InvalidOtp,

    /// A matching code exists but its expiry has passed
    #[error("Verification code expired")]
    OtpExpired,

    /// The code verified but the account could not be activated
    #[error("Account activation failed: {reason}")]
    ActivationFailed { reason: String },

    /// Cache or durable store unreachable during a step that cannot degrade
    #[error("Storage unavailable during {operation}: {message}")]
    StorageUnavailable { operation: String, message: String },

    #[error("Invalid input: {field}")]
    InvalidInput { field: String },

    /// The caller-supplied deadline elapsed
    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded { operation: String },
}

impl OtpError {
    pub(crate) fn storage(operation: &str, message: impl std::fmt::Display) -> Self {
        OtpError::StorageUnavailable {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code for API clients
    pub fn error_code(&self) -> &'static str {
        match self {
            OtpError::RateLimitExceeded { .. } => error_codes::RATE_LIMIT_EXCEEDED,
            OtpError::InvalidOtp => error_codes::OTP_INVALID,
            OtpError::OtpExpired => error_codes::OTP_EXPIRED,
            OtpError::ActivationFailed { .. } => error_codes::ACTIVATION_FAILED,
            OtpError::StorageUnavailable { .. } => error_codes::STORAGE_UNAVAILABLE,
            OtpError::InvalidInput { .. } => error_codes::VALIDATION_ERROR,
            OtpError::DeadlineExceeded { .. } => error_codes::DEADLINE_EXCEEDED,
        }
    }
}

impl IntoErrorResponse for OtpError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            OtpError::RateLimitExceeded { retry_after_seconds } => {
                ErrorResponse::new(self.error_code(), self.to_string())
                    .add_detail("retry_after", retry_after_seconds)
            }
            OtpError::ActivationFailed { .. } => {
                ErrorResponse::new(self.error_code(), "Account activation failed")
            }
            OtpError::StorageUnavailable { .. } => ErrorResponse::new(
                self.error_code(),
                "Service temporarily unavailable. Please try again later",
            ),
            OtpError::InvalidInput { field } => {
                ErrorResponse::new(self.error_code(), self.to_string()).add_detail("field", field)
            }
            _ => ErrorResponse::new(self.error_code(), self.to_string()),
        }
    }
}
