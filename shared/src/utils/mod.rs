//! Common utility functions

pub mod contact;
