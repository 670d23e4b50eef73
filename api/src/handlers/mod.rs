pub mod error;

pub use error::{delivery_error_response, otp_error_response, validation_error_response};
