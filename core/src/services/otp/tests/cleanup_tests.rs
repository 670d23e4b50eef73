use chrono::Duration;
use std::sync::Arc;

use crate::domain::entities::{OtpRecord, TargetType};
use crate::repositories::{InMemoryOtpRecordRepository, OtpRecordRepository};
use crate::services::otp::{Clock, ManualClock, OtpCleanupConfig, OtpCleanupService};

#[tokio::test]
async fn test_run_cleanup_removes_used_and_expired() {
    let clock = Arc::new(ManualClock::default());
    let now = clock.now();
    let repo = Arc::new(InMemoryOtpRecordRepository::new());

    let live = OtpRecord::new("+15551234567", TargetType::Customer, "111111", now, Duration::seconds(300));
    let used = OtpRecord::new("+15559876543", TargetType::Customer, "222222", now, Duration::seconds(300));
    let stale = OtpRecord::new("coach@gym.io", TargetType::Trainer, "333333", now, Duration::seconds(60));
    for record in [&live, &used, &stale] {
        repo.insert(record).await.unwrap();
    }
    repo.mark_used(used.id).await.unwrap();

    let service = OtpCleanupService::new(repo.clone(), OtpCleanupConfig::default()).with_clock(clock.clone());
    clock.advance(Duration::seconds(120));

    assert_eq!(service.run_cleanup().await.unwrap(), 2);
    let remaining = repo.all().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, live.id);
}

#[tokio::test]
async fn test_disabled_cleanup_is_noop() {
    let repo = Arc::new(InMemoryOtpRecordRepository::new());
    let record = OtpRecord::new(
        "+15551234567",
        TargetType::Customer,
        "111111",
        chrono::Utc::now() - Duration::hours(1),
        Duration::seconds(300),
    );
    repo.insert(&record).await.unwrap();

    let config = OtpCleanupConfig::from_interval(0);
    assert!(!config.enabled);

    let service = Arc::new(OtpCleanupService::new(repo.clone(), config));
    assert_eq!(service.run_cleanup().await.unwrap(), 0);
    assert_eq!(repo.all().await.len(), 1);
    assert!(service.start_background_task().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_task_sweeps_on_interval() {
    let repo = Arc::new(InMemoryOtpRecordRepository::new());
    let record = OtpRecord::new(
        "+15551234567",
        TargetType::Customer,
        "111111",
        chrono::Utc::now() - Duration::hours(1),
        Duration::seconds(300),
    );
    repo.insert(&record).await.unwrap();

    let service = Arc::new(OtpCleanupService::new(repo.clone(), OtpCleanupConfig::from_interval(10)));
    let handle = service.start_background_task().unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(11)).await;
    assert!(repo.all().await.is_empty());
    handle.abort();
}
