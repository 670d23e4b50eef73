//! Log-only delivery sink
//!
//! Writes a masked notification through `tracing` instead of contacting the
//! recipient. The code itself is never logged.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use gym_core::domain::entities::TargetType;
use gym_core::OtpDeliveryTrait;
use gym_shared::contact::{self, mask_contact, ContactKind};

use crate::InfrastructureError;

/// Delivery sink that only records a notification line
#[derive(Clone, Default)]
pub struct LogDelivery {
    /// Number of notifications recorded
    delivered: Arc<AtomicU64>,
    /// Whether to simulate gateway failures (for testing)
    simulate_failure: Arc<AtomicBool>,
}

impl LogDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of notifications recorded
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Enable or disable failure simulation
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// Record a notification, returning a message id
    pub async fn send(&self, target: &str, target_type: TargetType, code: &str) -> Result<String, InfrastructureError> {
        let masked = mask_contact(target);

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(target_contact = %masked, "Log delivery simulating failure");
            return Err(InfrastructureError::Delivery("Simulated delivery failure".to_string()));
        }

        let channel = match contact::classify(target) {
            Some(ContactKind::Email) => "email",
            Some(ContactKind::Phone) => "sms",
            // Account ids are resolved to a contact by the gateway
            None => "account",
        };

        let message_id = format!("log_{}", Uuid::new_v4());
        self.delivered.fetch_add(1, Ordering::SeqCst);

        info!(
            provider = "log",
            channel = channel,
            target_contact = %masked,
            target_type = %target_type,
            message_id = %message_id,
            code_length = code.len(),
            event = "otp_delivered",
            "OTP notification recorded"
        );

        Ok(message_id)
    }
}

#[async_trait]
impl OtpDeliveryTrait for LogDelivery {
    async fn deliver(&self, target: &str, target_type: TargetType, code: &str) -> Result<(), String> {
        self.send(target, target_type, code)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
