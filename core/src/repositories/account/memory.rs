//! In-process implementation of AccountRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::Account;
use crate::errors::DomainError;

use super::trait_::AccountRepository;

/// Account repository backed by a hash map
#[derive(Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an account, replacing any previous version
    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }

    /// Current state of an account
    pub async fn get(&self, id: Uuid) -> Option<Account> {
        self.accounts.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DomainError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_contact(&self, contact: &str) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.has_contact(contact)).cloned())
    }

    async fn set_active_and_save(&self, mut account: Account) -> Result<Account, DomainError> {
        let mut accounts = self.accounts.write().await;

        if !accounts.contains_key(&account.id) {
            return Err(DomainError::NotFound {
                resource: format!("{} {}", account.kind, account.id),
            });
        }

        account.activate();
        accounts.insert(account.id, account.clone());
        Ok(account)
    }
}
