//! MySQL implementation of the AccountRepository trait.
//!
//! Each account kind has its own table with the same shape, so one
//! repository type serves all three, parameterised by `TargetType`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use uuid::Uuid;

use gym_core::domain::entities::{Account, TargetType};
use gym_core::errors::DomainError;
use gym_core::repositories::AccountRepository;

const ACCOUNT_COLUMNS: &str = "id, full_name, email, phone, is_active, created_at, updated_at";

/// MySQL implementation of AccountRepository for one account table
pub struct MySqlAccountRepository {
    pool: MySqlPool,
    kind: TargetType,
}

impl MySqlAccountRepository {
    pub fn new(pool: MySqlPool, kind: TargetType) -> Self {
        Self { pool, kind }
    }

    /// Table backing the given account kind
    pub fn table_name(kind: TargetType) -> &'static str {
        match kind {
            TargetType::GymOwner => "gym_owners",
            TargetType::Trainer => "trainers",
            TargetType::Customer => "customers",
        }
    }

    fn table(&self) -> &'static str {
        Self::table_name(self.kind)
    }

    fn internal(context: &str, e: impl std::fmt::Display) -> DomainError {
        DomainError::Internal {
            message: format!("{}: {}", context, e),
        }
    }

    fn row_to_account(&self, row: &MySqlRow) -> Result<Account, DomainError> {
        let id: String = row.try_get("id").map_err(|e| Self::internal("Failed to get id", e))?;

        Ok(Account {
            id: Uuid::parse_str(&id).map_err(|e| Self::internal("Invalid account UUID", e))?,
            kind: self.kind,
            full_name: row
                .try_get("full_name")
                .map_err(|e| Self::internal("Failed to get full_name", e))?,
            email: row.try_get("email").map_err(|e| Self::internal("Failed to get email", e))?,
            phone: row.try_get("phone").map_err(|e| Self::internal("Failed to get phone", e))?,
            is_active: row
                .try_get("is_active")
                .map_err(|e| Self::internal("Failed to get is_active", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Self::internal("Failed to get created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| Self::internal("Failed to get updated_at", e))?,
        })
    }
}

#[async_trait]
impl AccountRepository for MySqlAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DomainError> {
        let query = format!("SELECT {} FROM {} WHERE id = ?", ACCOUNT_COLUMNS, self.table());

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to find account by id", e))?;

        row.as_ref().map(|row| self.row_to_account(row)).transpose()
    }

    async fn find_by_contact(&self, contact: &str) -> Result<Option<Account>, DomainError> {
        let query = format!(
            "SELECT {} FROM {} WHERE LOWER(email) = LOWER(?) OR phone = ? LIMIT 1",
            ACCOUNT_COLUMNS,
            self.table()
        );

        let row = sqlx::query(&query)
            .bind(contact)
            .bind(contact)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to find account by contact", e))?;

        row.as_ref().map(|row| self.row_to_account(row)).transpose()
    }

    async fn set_active_and_save(&self, mut account: Account) -> Result<Account, DomainError> {
        account.activate();

        let query = format!(
            "UPDATE {} SET is_active = ?, updated_at = ? WHERE id = ?",
            self.table()
        );

        let result = sqlx::query(&query)
            .bind(account.is_active)
            .bind(account.updated_at)
            .bind(account.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to save account", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                resource: format!("{} {}", self.kind, account.id),
            });
        }

        Ok(account)
    }
}
