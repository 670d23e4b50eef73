//! HTTP layer for OTP issuance and account activation
//!
//! Exposes the application factory and state so the binary and the
//! integration tests build the same app.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use app::{create_app, AppOtpService, AppState};
