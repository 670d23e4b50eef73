//! HTTP tests for the OTP endpoints over in-memory collaborators

use std::sync::Arc;
use std::time::Duration;

use actix_web::{http::StatusCode, test, web};
use async_trait::async_trait;
use serde_json::{json, Value};

use gym_api::{create_app, AppOtpService, AppState};
use gym_core::domain::entities::{Account, TargetType};
use gym_core::{
    AccountActivator, CacheRateLimiter, CacheServiceTrait, InMemoryAccountRepository, InMemoryOtpRecordRepository,
    OtpRecordRepository, OtpService, OtpServiceConfig, RateLimiterTrait,
};
use gym_infra::{LogDelivery, MemoryCache};
use gym_shared::{Environment, OtpConfig};

// Cache whose every operation fails
struct UnreachableCache;

#[async_trait]
impl CacheServiceTrait for UnreachableCache {
    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), String> {
        Err("connection refused".to_string())
    }
    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<bool, String> {
        Err("connection refused".to_string())
    }
    async fn get(&self, _key: &str) -> Result<Option<String>, String> {
        Err("connection refused".to_string())
    }
    async fn delete(&self, _key: &str) -> Result<bool, String> {
        Err("connection refused".to_string())
    }
    async fn exists(&self, _key: &str) -> Result<bool, String> {
        Err("connection refused".to_string())
    }
    async fn increment(&self, _key: &str) -> Result<i64, String> {
        Err("connection refused".to_string())
    }
    async fn expire(&self, _key: &str, _ttl_secs: u64) -> Result<(), String> {
        Err("connection refused".to_string())
    }
    async fn ttl(&self, _key: &str) -> Result<Option<u64>, String> {
        Err("connection refused".to_string())
    }
}

struct TestContext {
    customers: Arc<InMemoryAccountRepository>,
    delivery: LogDelivery,
    state: web::Data<AppState>,
}

fn context_with(echo_code: bool, cache: Arc<dyn CacheServiceTrait>) -> TestContext {
    let config = OtpServiceConfig {
        default_code: Some("123456".to_string()),
        ..Default::default()
    };

    let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(CacheRateLimiter::new(
        Arc::new(MemoryCache::new()),
        config.key_namespace.clone(),
        config.rate_limit_window_seconds,
        1,
    ));
    let records: Arc<dyn OtpRecordRepository> = Arc::new(InMemoryOtpRecordRepository::new());
    let customers = Arc::new(InMemoryAccountRepository::new());
    let activator = AccountActivator::new(
        Arc::new(InMemoryAccountRepository::new()),
        Arc::new(InMemoryAccountRepository::new()),
        customers.clone(),
    );

    let otp_service: Arc<AppOtpService> =
        Arc::new(OtpService::new(cache, rate_limiter, records, activator, config));
    let delivery = LogDelivery::new();

    let state = web::Data::new(AppState::new(
        otp_service,
        Arc::new(delivery.clone()),
        echo_code,
        Duration::from_secs(5),
    ));

    TestContext {
        customers,
        delivery,
        state,
    }
}

fn context(echo_code: bool) -> TestContext {
    context_with(echo_code, Arc::new(MemoryCache::new()))
}

async fn register_customer(ctx: &TestContext, phone: &str) -> Account {
    let account = Account::new(TargetType::Customer, "Jamie Rivera").with_phone(phone);
    ctx.customers.insert(account.clone()).await;
    account
}

#[actix_web::test]
async fn test_health_check() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_request_id_is_echoed_on_errors() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .insert_header(("X-Request-ID", "front-desk-7"))
        .set_json(json!({"target": "+15551234567", "target_type": "customer", "otp": "000000"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "front-desk-7");
}

#[actix_web::test]
async fn test_send_then_verify_activates_customer() {
    let ctx = context(true);
    let account = register_customer(&ctx, "+15551234567").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15551234567", "target_type": "customer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "OTP sent successfully");
    assert_eq!(body["expires_in"], 300);
    assert_eq!(body["resend_after"], 60);
    assert_eq!(body["otp"], "123456");
    assert_eq!(ctx.delivery.delivered_count(), 1);

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({"target": "+15551234567", "target_type": "customer", "otp": "123456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "OTP verified successfully");
    assert_eq!(body["target"], "+15551234567");
    assert_eq!(body["target_type"], "customer");
    assert_eq!(body["is_active"], true);
    assert!(ctx.customers.get(account.id).await.unwrap().is_active);

    // Codes are single use
    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({"target": "+15551234567", "target_type": "customer", "otp": "123456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "OTP_INVALID");
}

#[actix_web::test]
async fn test_code_not_echoed_without_opt_in() {
    // Nothing configured: the environment falls back to development
    assert_eq!(Environment::default(), Environment::Development);
    let ctx = context(OtpConfig::default().echo_code);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "coach@gym.io", "target_type": "trainer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("otp").is_none());
}

#[actix_web::test]
async fn test_second_send_is_rate_limited() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let send = || {
        test::TestRequest::post()
            .uri("/api/v1/otp/send")
            .set_json(json!({"target": "+15551234567", "target_type": "customer"}))
            .to_request()
    };

    let resp = test::call_service(&app, send()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, send()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().get("Retry-After").is_some());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "RATE_LIMIT_EXCEEDED");
    assert!(body["details"]["retry_after"].as_u64().unwrap() <= 60);
}

#[actix_web::test]
async fn test_wrong_code_is_rejected() {
    let ctx = context(true);
    register_customer(&ctx, "+15551234567").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15551234567", "target_type": "customer"}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({"target": "+15551234567", "target_type": "customer", "otp": "654321"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "OTP_INVALID");
}

#[actix_web::test]
async fn test_verify_without_account_is_unprocessable() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15559876543", "target_type": "customer"}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({"target": "+15559876543", "target_type": "customer", "otp": "123456"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ACTIVATION_FAILED");
}

#[actix_web::test]
async fn test_invalid_requests_are_bad_requests() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15551234567", "target_type": "admin"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BAD_REQUEST");

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "", "target_type": "customer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["details"].get("target").is_some());
}

#[actix_web::test]
async fn test_delivery_failure_is_service_unavailable() {
    let ctx = context(true);
    ctx.delivery.set_simulate_failure(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15551234567", "target_type": "customer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "DELIVERY_FAILED");
    assert!(body.get("otp").is_none());
}

#[actix_web::test]
async fn test_cache_outage_is_service_unavailable() {
    let ctx = context_with(true, Arc::new(UnreachableCache));
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({"target": "+15551234567", "target_type": "customer"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "STORAGE_UNAVAILABLE");
    assert_eq!(ctx.delivery.delivered_count(), 0);
}

#[actix_web::test]
async fn test_unknown_route_returns_not_found() {
    let ctx = context(true);
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/v1/nothing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
