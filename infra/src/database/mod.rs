//! Database module - MySQL implementations using SQLx
//!
//! Connection pool management and the repository implementations backing
//! the OTP record store and the three account tables.

pub mod connection;
pub mod mysql;

#[cfg(test)]
mod tests;

pub use connection::DatabasePool;
pub use mysql::{MySqlAccountRepository, MySqlOtpRecordRepository};
