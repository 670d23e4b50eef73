use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gym_api::{create_app, AppOtpService, AppState};
use gym_core::domain::entities::TargetType;
use gym_core::{
    AccountActivator, CacheRateLimiter, CacheServiceTrait, OtpCleanupConfig, OtpCleanupService,
    OtpRecordRepository, OtpService, OtpServiceConfig, RateLimiterTrait,
};
use gym_infra::{DatabasePool, LogDelivery, MemoryCache, MySqlAccountRepository, MySqlOtpRecordRepository, RedisClient};
use gym_shared::{AppConfig, CacheType, LogFormat, LoggingConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(&config.logging);

    info!(environment = %config.environment, "Starting GymFlow API Server");
    if config.otp.default_code.is_some() {
        warn!("OTP_DEFAULT_CODE is set; every issued code is the fixed override");
    }

    let cache: Arc<dyn CacheServiceTrait> = match config.cache.cache_type {
        CacheType::Redis => Arc::new(
            RedisClient::new(config.cache.clone())
                .await
                .context("Failed to connect to Redis")?,
        ),
        CacheType::Memory => {
            warn!("Using in-process cache; codes and rate limits are not shared between instances");
            Arc::new(MemoryCache::new())
        }
    };
    let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(CacheRateLimiter::new(
        cache.clone(),
        config.otp.key_namespace.clone(),
        config.otp.rate_limit_window_seconds,
        config.otp.rate_limit_max_requests,
    ));

    let database = DatabasePool::new(config.database.clone())
        .await
        .context("Failed to connect to the database")?;
    database.run_migrations().await.context("Failed to run migrations")?;
    let pool = database.get_pool().clone();

    let records: Arc<dyn OtpRecordRepository> = Arc::new(MySqlOtpRecordRepository::new(pool.clone()));
    let activator = AccountActivator::new(
        Arc::new(MySqlAccountRepository::new(pool.clone(), TargetType::GymOwner)),
        Arc::new(MySqlAccountRepository::new(pool.clone(), TargetType::Trainer)),
        Arc::new(MySqlAccountRepository::new(pool, TargetType::Customer)),
    );

    let otp_service: Arc<AppOtpService> = Arc::new(OtpService::new(
        cache,
        rate_limiter,
        records.clone(),
        activator,
        OtpServiceConfig::from(&config.otp),
    ));

    let cleanup = Arc::new(OtpCleanupService::new(
        records,
        OtpCleanupConfig::from_interval(config.otp.cleanup_interval_seconds),
    ));
    let cleanup_task = cleanup.start_background_task();

    let state = web::Data::new(AppState::new(
        otp_service,
        Arc::new(LogDelivery::new()),
        config.otp.echo_code,
        Duration::from_secs(config.server.request_timeout),
    ));

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }
    server.bind(&bind_address)?.run().await?;

    if let Some(task) = cleanup_task {
        task.abort();
    }
    database.close().await;
    Ok(())
}

/// Initialize tracing from the logging configuration
///
/// `RUST_LOG` overrides the configured level. Records emitted through `log`
/// (actix's request logger) are forwarded to the subscriber.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match logging.format {
        LogFormat::Json => subscriber.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer().pretty()).init(),
        LogFormat::Compact => subscriber.with(tracing_subscriber::fmt::layer().compact()).init(),
    }
}
