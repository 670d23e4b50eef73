//! OTP route handlers
//!
//! - `POST /api/v1/otp/send` issues a code and hands it to the delivery sink
//! - `POST /api/v1/otp/verify` consumes a code and activates the account

pub mod send_otp;
pub mod verify_otp;
