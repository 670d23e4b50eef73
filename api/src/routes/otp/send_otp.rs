use actix_web::{web, HttpResponse};
use validator::Validate;

use gym_shared::contact::mask_contact;

use crate::app::AppState;
use crate::dto::{SendOtpRequest, SendOtpResponse};
use crate::handlers::{delivery_error_response, otp_error_response, validation_error_response};

/// Handler for POST /api/v1/otp/send
///
/// # Request Body
///
/// ```json
/// {
///     "target": "+15551234567",
///     "target_type": "customer"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "OTP sent successfully",
///     "expires_in": 300,
///     "resend_after": 60
/// }
/// ```
///
/// The code is echoed back as `otp` only when `OTP_ECHO_CODE` is enabled,
/// which configuration validation refuses in production.
///
/// ## Errors
/// - 400: invalid request data
/// - 429: a code was issued too recently (`Retry-After` header set)
/// - 503: the cache or the delivery sink is unavailable
pub async fn send_otp(state: web::Data<AppState>, request: web::Json<SendOtpRequest>) -> HttpResponse {
    let request = request.into_inner();

    if let Err(errors) = request.validate() {
        tracing::warn!(
            target_contact = %mask_contact(&request.target),
            "Validation failed for send_otp request"
        );
        return validation_error_response(&errors);
    }

    let issued = match state
        .otp_service
        .generate_otp_within(state.request_timeout, &request.target, request.target_type)
        .await
    {
        Ok(issued) => issued,
        Err(error) => return otp_error_response(&error),
    };

    if let Err(e) = state
        .delivery
        .deliver(&issued.target, issued.target_type, &issued.code)
        .await
    {
        // The code stays valid; the client may retry after the cooldown
        tracing::error!(
            target_contact = %mask_contact(&issued.target),
            target_type = %issued.target_type,
            error = %e,
            event = "otp_delivery_failed",
            "Failed to deliver OTP"
        );
        return delivery_error_response();
    }

    let otp = state.echo_code.then(|| issued.code.clone());

    HttpResponse::Ok().json(SendOtpResponse {
        message: "OTP sent successfully".to_string(),
        expires_in: issued.expires_in_seconds,
        resend_after: issued.resend_after_seconds,
        otp,
    })
}
