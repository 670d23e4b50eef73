//! Mapping of OTP failures to HTTP responses

use actix_web::{http::StatusCode, HttpResponse};
use validator::ValidationErrors;

use gym_core::OtpError;
use gym_shared::{error_codes, ErrorResponse, IntoErrorResponse};

/// HTTP status for an OTP failure
pub fn status_for(error: &OtpError) -> StatusCode {
    match error {
        OtpError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        OtpError::InvalidOtp | OtpError::OtpExpired | OtpError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        OtpError::ActivationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OtpError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        OtpError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Convert an OTP failure into the standard error envelope
///
/// Rate-limit responses also carry a `Retry-After` header.
pub fn otp_error_response(error: &OtpError) -> HttpResponse {
    let mut builder = HttpResponse::build(status_for(error));
    if let OtpError::RateLimitExceeded { retry_after_seconds } = error {
        builder.insert_header(("Retry-After", retry_after_seconds.to_string()));
    }
    builder.json(error.to_error_response())
}

/// 400 response listing the fields that failed validation
pub fn validation_error_response(errors: &ValidationErrors) -> HttpResponse {
    let mut response = ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data");
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
            .collect();
        response = response.add_detail(field.to_string(), messages);
    }
    HttpResponse::BadRequest().json(response)
}

/// 503 response for a code that was issued but could not be handed over
pub fn delivery_error_response() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ErrorResponse::new(
        error_codes::DELIVERY_FAILED,
        "Failed to deliver OTP. Please try again later",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&OtpError::RateLimitExceeded { retry_after_seconds: 30 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&OtpError::InvalidOtp), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&OtpError::OtpExpired), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&OtpError::ActivationFailed {
                reason: "account not found".to_string()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&OtpError::StorageUnavailable {
                operation: "cache_set".to_string(),
                message: "connection refused".to_string()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&OtpError::DeadlineExceeded {
                operation: "verify_otp".to_string()
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_rate_limit_sets_retry_after_header() {
        let response = otp_error_response(&OtpError::RateLimitExceeded { retry_after_seconds: 42 });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "42");
    }
}
