//! Account entity shared by gym owners, trainers and customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::otp_record::TargetType;

/// Registered account awaiting or holding activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,

    /// Which account table this row lives in
    pub kind: TargetType,

    pub full_name: String,

    pub email: Option<String>,

    /// Phone number in E.164 format
    pub phone: Option<String>,

    /// Whether the account has completed OTP activation
    pub is_active: bool,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new inactive account
    pub fn new(kind: TargetType, full_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            full_name: full_name.into(),
            email: None,
            phone: None,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Marks the account as active
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Checks whether the given contact belongs to this account
    pub fn has_contact(&self, contact: &str) -> bool {
        self.email
            .as_deref()
            .map(|email| email.eq_ignore_ascii_case(contact))
            .unwrap_or(false)
            || self.phone.as_deref() == Some(contact)
    }
}
