//! In-process implementation of OtpRecordRepository
//!
//! Used when the server runs without a database and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::otp_record::{OtpRecord, TargetType};
use crate::errors::DomainError;

use super::trait_::OtpRecordRepository;

/// OTP record repository backed by a vector
#[derive(Clone, Default)]
pub struct InMemoryOtpRecordRepository {
    records: Arc<RwLock<Vec<OtpRecord>>>,
}

impl InMemoryOtpRecordRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored records
    pub async fn all(&self) -> Vec<OtpRecord> {
        self.records.read().await.clone()
    }

    /// Records stored for a target
    pub async fn records_for(&self, target: &str, target_type: TargetType) -> Vec<OtpRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.target == target && r.target_type == target_type)
            .cloned()
            .collect()
    }
}

fn matches(record: &OtpRecord, target: &str, target_type: TargetType, code: &str) -> bool {
    record.target == target && record.target_type == target_type && record.code == code
}

#[async_trait]
impl OtpRecordRepository for InMemoryOtpRecordRepository {
    async fn insert(&self, record: &OtpRecord) -> Result<(), DomainError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_valid(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| matches(r, target, target_type, code) && r.is_valid_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn find_expired_match(
        &self,
        target: &str,
        target_type: TargetType,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| matches(r, target, target_type, code) && !r.used && r.is_expired_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id && !r.used) {
            Some(record) => {
                record.mark_used(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retire_outstanding(
        &self,
        target: &str,
        target_type: TargetType,
        keep: Option<Uuid>,
    ) -> Result<u64, DomainError> {
        let now = Utc::now();
        let mut retired = 0;
        for record in self.records.write().await.iter_mut() {
            let outstanding = record.target == target && record.target_type == target_type && !record.used;
            if outstanding && Some(record.id) != keep {
                record.mark_used(now);
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn delete_reclaimable(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.is_reclaimable_at(now));
        Ok((before - records.len()) as u64)
    }
}
