//! Application state and factory
//!
//! This module holds the shared services handed to every worker and builds
//! the Actix-web application around them.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpResponse};

use gym_core::{CacheServiceTrait, OtpDeliveryTrait, OtpRecordRepository, OtpService, RateLimiterTrait};
use gym_shared::{error_codes, ErrorResponse};

use crate::middleware::RequestIdMiddleware;
use crate::routes::otp::{send_otp::send_otp, verify_otp::verify_otp};

/// OTP engine over type-erased collaborators chosen at startup
pub type AppOtpService = OtpService<dyn CacheServiceTrait, dyn RateLimiterTrait, dyn OtpRecordRepository>;

/// Application state that holds shared services
pub struct AppState {
    pub otp_service: Arc<AppOtpService>,
    pub delivery: Arc<dyn OtpDeliveryTrait>,
    /// Return issued codes in the send response
    pub echo_code: bool,
    /// Deadline applied to each OTP operation
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        otp_service: Arc<AppOtpService>,
        delivery: Arc<dyn OtpDeliveryTrait>,
        echo_code: bool,
        request_timeout: Duration,
    ) -> Self {
        Self {
            otp_service,
            delivery,
            echo_code,
            request_timeout,
        }
    }
}

/// Create and configure the application with all dependencies
pub fn create_app(
    app_state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(app_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(RequestIdMiddleware)
        .wrap(Logger::new(r#"%a "%r" %s %b %T request_id=%{x-request-id}o"#))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1").service(
                web::scope("/otp")
                    .route("/send", web::post().to(send_otp))
                    .route("/verify", web::post().to(verify_otp)),
            ),
        )
        .default_service(web::route().to(|| async {
            HttpResponse::NotFound().json(ErrorResponse::new(
                error_codes::NOT_FOUND,
                "The requested resource was not found",
            ))
        }))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "gym-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Malformed or mistyped JSON bodies, including unknown target types
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::new(error_codes::BAD_REQUEST, "Invalid request body")
        .add_detail("reason", err.to_string());
    actix_web::error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
