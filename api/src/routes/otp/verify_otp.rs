use actix_web::{web, HttpResponse};
use validator::Validate;

use gym_shared::contact::mask_contact;

use crate::app::AppState;
use crate::dto::{VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::{otp_error_response, validation_error_response};

/// Handler for POST /api/v1/otp/verify
///
/// # Request Body
///
/// ```json
/// {
///     "target": "+15551234567",
///     "target_type": "customer",
///     "otp": "482913"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "OTP verified successfully",
///     "target": "+15551234567",
///     "target_type": "customer",
///     "is_active": true
/// }
/// ```
///
/// ## Errors
/// - 400: invalid, expired or already used code
/// - 422: code accepted but the account could not be activated
/// - 503: storage unavailable
pub async fn verify_otp(state: web::Data<AppState>, request: web::Json<VerifyOtpRequest>) -> HttpResponse {
    let request = request.into_inner();

    if let Err(errors) = request.validate() {
        tracing::warn!(
            target_contact = %mask_contact(&request.target),
            "Validation failed for verify_otp request"
        );
        return validation_error_response(&errors);
    }

    match state
        .otp_service
        .verify_otp_within(state.request_timeout, &request.target, request.target_type, &request.otp)
        .await
    {
        Ok(verified) => HttpResponse::Ok().json(VerifyOtpResponse {
            message: "OTP verified successfully".to_string(),
            target: request.target,
            target_type: request.target_type,
            is_active: verified.account.is_active,
        }),
        Err(error) => otp_error_response(&error),
    }
}
