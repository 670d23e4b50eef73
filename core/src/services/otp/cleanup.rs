//! Reclaim sweep for used and expired OTP records
//!
//! Records are insert-only, so every issuance leaves a row behind. This
//! service periodically deletes the rows that can no longer be verified.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::OtpRecordRepository;

use super::clock::{Clock, SystemClock};

/// Configuration for the OTP cleanup service
#[derive(Debug, Clone)]
pub struct OtpCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for OtpCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            enabled: true,
        }
    }
}

impl OtpCleanupConfig {
    /// Build from an interval where zero disables the sweep
    pub fn from_interval(interval_seconds: u64) -> Self {
        Self {
            interval_seconds,
            enabled: interval_seconds > 0,
        }
    }
}

/// Service deleting reclaimable OTP records
pub struct OtpCleanupService<R: OtpRecordRepository + ?Sized + 'static> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    config: OtpCleanupConfig,
}

impl<R: OtpRecordRepository + ?Sized + 'static> OtpCleanupService<R> {
    /// Create a new cleanup service
    pub fn new(repository: Arc<R>, config: OtpCleanupConfig) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records deleted
    /// * `Err(DomainError)` - If the store could not be swept
    pub async fn run_cleanup(&self) -> Result<u64, DomainError> {
        if !self.config.enabled {
            return Ok(0);
        }

        let deleted = self.repository.delete_reclaimable(self.clock.now()).await?;
        info!(deleted = deleted, event = "otp_cleanup_completed", "Deleted reclaimable OTP records");
        Ok(deleted)
    }

    /// Start the cleanup service as a background task
    ///
    /// Returns `None` when the sweep is disabled.
    pub fn start_background_task(self: Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.enabled {
            warn!("OTP cleanup service is disabled");
            return None;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        Some(tokio::spawn(async move {
            info!(
                interval_seconds = self.config.interval_seconds,
                "Starting OTP cleanup background task"
            );

            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, event = "otp_cleanup_failed", "OTP cleanup cycle failed");
                }
            }
        }))
    }
}
