use serde::{Deserialize, Serialize};
use validator::Validate;

use gym_core::domain::entities::TargetType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Email address, phone number or account id
    #[validate(length(min = 1, max = 255))]
    pub target: String,
    pub target_type: TargetType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub message: String,
    pub expires_in: u64,
    pub resend_after: u64, // seconds until can resend
    /// Echoed back in development only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, max = 255))]
    pub target: String,
    pub target_type: TargetType,
    #[validate(length(min = 1, max = 12))]
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub target: String,
    pub target_type: TargetType,
    pub is_active: bool,
}
