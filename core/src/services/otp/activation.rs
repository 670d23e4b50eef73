//! Account activation after a successful verification

use std::sync::Arc;
use uuid::Uuid;

use gym_shared::contact::{self, mask_contact};

use crate::domain::entities::{Account, TargetType};
use crate::errors::{DomainError, OtpError};
use crate::repositories::AccountRepository;

/// Resolves the account behind a target and flips it active
///
/// The target is looked up by id when it parses as a UUID, otherwise by
/// email or phone.
#[derive(Clone)]
pub struct AccountActivator {
    gym_owners: Arc<dyn AccountRepository>,
    trainers: Arc<dyn AccountRepository>,
    customers: Arc<dyn AccountRepository>,
}

impl AccountActivator {
    pub fn new(
        gym_owners: Arc<dyn AccountRepository>,
        trainers: Arc<dyn AccountRepository>,
        customers: Arc<dyn AccountRepository>,
    ) -> Self {
        Self {
            gym_owners,
            trainers,
            customers,
        }
    }

    fn repository(&self, target_type: TargetType) -> &Arc<dyn AccountRepository> {
        match target_type {
            TargetType::GymOwner => &self.gym_owners,
            TargetType::Trainer => &self.trainers,
            TargetType::Customer => &self.customers,
        }
    }

    /// Find the account a target refers to
    pub async fn resolve(&self, target: &str, target_type: TargetType) -> Result<Option<Account>, DomainError> {
        let repository = self.repository(target_type);
        match Uuid::parse_str(target) {
            Ok(id) => repository.find_by_id(id).await,
            Err(_) => repository.find_by_contact(&contact::normalize(target)).await,
        }
    }

    /// Activate the account behind a verified target
    pub async fn activate(&self, target: &str, target_type: TargetType) -> Result<Account, OtpError> {
        let account = self
            .resolve(target, target_type)
            .await
            .map_err(|e| OtpError::ActivationFailed {
                reason: format!("account lookup failed: {}", e),
            })?
            .ok_or_else(|| OtpError::ActivationFailed {
                reason: format!("no {} account for target", target_type),
            })?;

        let account = self
            .repository(target_type)
            .set_active_and_save(account)
            .await
            .map_err(|e| OtpError::ActivationFailed {
                reason: format!("failed to save account: {}", e),
            })?;

        tracing::info!(
            target_contact = %mask_contact(target),
            target_type = %target_type,
            account_id = %account.id,
            event = "account_activated",
            "Account activated"
        );

        Ok(account)
    }
}
