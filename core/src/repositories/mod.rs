pub mod account;
pub mod otp;

pub use account::{AccountRepository, InMemoryAccountRepository};
pub use otp::{InMemoryOtpRecordRepository, OtpRecordRepository};
