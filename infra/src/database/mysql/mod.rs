//! MySQL repository implementations

pub mod account_repository_impl;
pub mod otp_record_repository_impl;

pub use account_repository_impl::MySqlAccountRepository;
pub use otp_record_repository_impl::MySqlOtpRecordRepository;
