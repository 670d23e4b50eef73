//! Account store interface, one implementation per account table.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Account;
use crate::errors::DomainError;

/// Repository trait for gym owner, trainer and customer accounts
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by its identifier
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DomainError>;

    /// Find an account by email address or phone number
    async fn find_by_contact(&self, contact: &str) -> Result<Option<Account>, DomainError>;

    /// Set the account active and persist it
    ///
    /// # Returns
    /// * `Ok(Account)` - The saved account with `is_active = true`
    /// * `Err(DomainError::NotFound)` - The account no longer exists
    async fn set_active_and_save(&self, account: Account) -> Result<Account, DomainError>;
}
