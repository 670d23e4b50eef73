//! MySQL implementation of the OtpRecordRepository trait.
//!
//! Rows live in `otp_records`. Issuance inserts and retires older rows; the
//! conditional `used` flip on a single id decides which of two concurrent
//! verifications consumed the code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use uuid::Uuid;

use gym_core::domain::entities::{OtpRecord, TargetType};
use gym_core::errors::DomainError;
use gym_core::repositories::OtpRecordRepository;
use gym_shared::contact::mask_contact;

const RECORD_COLUMNS: &str = "id, target, target_type, code, used, expires_at, created_at, updated_at";

/// MySQL implementation of OtpRecordRepository
pub struct MySqlOtpRecordRepository {
    pool: MySqlPool,
}

impl MySqlOtpRecordRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn internal(context: &str, e: impl std::fmt::Display) -> DomainError {
        DomainError::Internal {
            message: format!("{}: {}", context, e),
        }
    }

    fn row_to_record(row: &MySqlRow) -> Result<OtpRecord, DomainError> {
        let id: String = row.try_get("id").map_err(|e| Self::internal("Failed to get id", e))?;
        let target_type: String = row
            .try_get("target_type")
            .map_err(|e| Self::internal("Failed to get target_type", e))?;

        Ok(OtpRecord {
            id: Uuid::parse_str(&id).map_err(|e| Self::internal("Invalid record UUID", e))?,
            target: row.try_get("target").map_err(|e| Self::internal("Failed to get target", e))?,
            target_type: target_type
                .parse::<TargetType>()
                .map_err(|e| Self::internal("Invalid target_type", e))?,
            code: row.try_get("code").map_err(|e| Self::internal("Failed to get code", e))?,
            used: row.try_get("used").map_err(|e| Self::internal("Failed to get used", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| Self::internal("Failed to get expires_at", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Self::internal("Failed to get created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| Self::internal("Failed to get updated_at", e))?,
        })
    }

    async fn find_one(
        &self,
        query: &str,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let row = sqlx::query(query)
            .bind(target)
            .bind(target_type.as_str())
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    target_contact = %mask_contact(target),
                    error = %e,
                    "Failed to query OTP records"
                );
                Self::internal("Failed to query OTP records", e)
            })?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}

#[async_trait]
impl OtpRecordRepository for MySqlOtpRecordRepository {
    async fn insert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO otp_records (
                id, target, target_type, code, used, expires_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(record.id.to_string())
            .bind(&record.target)
            .bind(record.target_type.as_str())
            .bind(&record.code)
            .bind(record.used)
            .bind(record.expires_at)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to insert OTP record", e))?;

        Ok(())
    }

    async fn find_valid(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM otp_records
            WHERE target = ? AND target_type = ? AND code = ?
              AND used = FALSE AND expires_at > ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            RECORD_COLUMNS
        );
        self.find_one(&query, target, target_type, code, now).await
    }

    async fn find_expired_match(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let query = format!(
            r#"
            SELECT {}
            FROM otp_records
            WHERE target = ? AND target_type = ? AND code = ?
              AND used = FALSE AND expires_at <= ?
            ORDER BY expires_at DESC
            LIMIT 1
            "#,
            RECORD_COLUMNS
        );
        self.find_one(&query, target, target_type, code, now).await
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, DomainError> {
        let query = r#"
            UPDATE otp_records
            SET used = TRUE, updated_at = ?
            WHERE id = ? AND used = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to mark OTP record used", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn retire_outstanding(
        &self,
        target: &str,
        target_type: TargetType,
        keep: Option<Uuid>,
    ) -> Result<u64, DomainError> {
        // An empty id never matches, so `None` retires every row
        let keep = keep.map(|id| id.to_string()).unwrap_or_default();
        let query = r#"
            UPDATE otp_records
            SET used = TRUE, updated_at = ?
            WHERE target = ? AND target_type = ? AND used = FALSE AND id <> ?
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(target)
            .bind(target_type.as_str())
            .bind(keep)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to retire outstanding OTP records", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_reclaimable(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let query = r#"
            DELETE FROM otp_records
            WHERE used = TRUE OR expires_at <= ?
        "#;

        let result = sqlx::query(query)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::internal("Failed to delete reclaimable OTP records", e))?;

        Ok(result.rows_affected())
    }
}
