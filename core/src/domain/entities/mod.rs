//! Domain entities representing core business objects.

pub mod account;
pub mod otp_record;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use account::Account;
pub use otp_record::{OtpRecord, TargetType, DEFAULT_CODE_LENGTH, DEFAULT_EXPIRATION_SECONDS};
