//! Shared utilities and common types for the GymFlow server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error response structures
//! - Contact utilities (email/phone validation and log masking)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CacheType, ConfigError, DatabaseConfig, Environment, LogFormat,
    LoggingConfig, OtpConfig, ServerConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::contact;
