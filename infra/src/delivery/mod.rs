//! OTP delivery sinks
//!
//! Delivery is the only place the contact channel of a target matters. The
//! log sink stands in for an email/SMS gateway in development and tests.

pub mod log_delivery;

pub use log_delivery::LogDelivery;
