// ============================================================================
// Group chat message service
// ============================================================================
//
// HTTP API (axum) + moderation worker (Kafka) + realtime broadcast (Redis),
// all wired around the MessagePipeline.
//
// ============================================================================

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod health;
pub mod kafka;
pub mod logging;
pub mod media;
pub mod message;
pub mod metrics;
pub mod moderation_worker;
pub mod pipeline;
pub mod realtime;
pub mod routes;
pub mod utils;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use config::Config;
use context::AppContext;
use db::{PostgresGroupDirectory, PostgresMessageStore};
use health::{HealthProbe, PostgresProbe, RedisProbe};
use kafka::{KafkaProducer, VerdictConsumer};
use media::{DiskAttachmentStore, UrlSigner};
use moderation_worker::{ModerationWorker, PendingSweeper};
use pipeline::{MessagePipeline, PipelineDeps, PipelineSettings};
use realtime::RedisBroadcaster;
use utils::mask_url_credentials;

/// Start every component and run until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    // Database
    tracing::info!(
        "Connecting to database at: {}",
        mask_url_credentials(&config.database_url)
    );
    let db_pool = db::create_pool(&config.database_url, &config.db)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    if config.db.run_migrations {
        tracing::info!("Applying database migrations...");
        db::run_migrations(&db_pool).await?;
        tracing::info!("Database migrations applied successfully.");
    }

    // Redis
    tracing::info!(
        "Connecting to Redis at: {}",
        mask_url_credentials(&config.redis.url)
    );
    let broadcaster = RedisBroadcaster::connect(
        &config.redis.url,
        &config.redis.group_channel_prefix,
        Duration::from_secs(config.redis.connect_timeout_secs),
    )
    .await?;
    tracing::info!("Connected to Redis");

    // Kafka
    let producer = Arc::new(KafkaProducer::new(&config.kafka)?);
    let verdicts = Arc::new(VerdictConsumer::new(&config.kafka)?);

    // Attachments
    let signer = UrlSigner::new(
        &config.media.url_signing_secret,
        &config.media.public_base_url,
    );
    let media = Arc::new(DiskAttachmentStore::new(&config.media.data_dir, signer).await?);

    let pipeline = MessagePipeline::new(PipelineDeps {
        store: Arc::new(PostgresMessageStore::new(db_pool.clone())),
        attachments: media.clone(),
        directory: Arc::new(PostgresGroupDirectory::new(db_pool.clone())),
        notifier: producer.clone(),
        moderation: producer.clone(),
        broadcaster: Arc::new(broadcaster.clone()),
    })
    .with_settings(PipelineSettings {
        failure_policy: config.media.failure_policy,
        url_ttl: Duration::from_secs(config.media.url_ttl_secs),
        log_message_content: config.logging.log_message_content,
    });

    let health_probes: Vec<Arc<dyn HealthProbe>> = vec![
        Arc::new(PostgresProbe::new(db_pool.clone())),
        Arc::new(RedisProbe::new(broadcaster.connection())),
    ];

    // Long-running workers
    let cancel = CancellationToken::new();
    let workers = TaskTracker::new();

    let worker = ModerationWorker::new(
        verdicts,
        pipeline.clone(),
        Duration::from_millis(config.moderation.poll_timeout_ms),
    );
    workers.spawn(worker.run(cancel.child_token()));

    if config.moderation.sweep_enabled() {
        let sweeper = PendingSweeper::new(
            pipeline.clone(),
            Duration::from_secs(config.moderation.resend_after_secs),
            Duration::from_secs(config.moderation.sweep_interval_secs),
            config.moderation.sweep_batch,
        );
        workers.spawn(sweeper.run(cancel.child_token()));
    } else {
        tracing::info!("Pending moderation sweep disabled (MODERATION_RESEND_AFTER_SECS=0)");
    }
    workers.close();

    // HTTP
    let app_context = Arc::new(AppContext::new(
        config.clone(),
        pipeline.clone(),
        media,
        health_probes,
    ));
    let app = routes::create_router(app_context);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    tracing::info!("Group chat server listening on http://{}", config.bind_address);

    let shutdown = cancel.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received. Shutting down...");
        shutdown.cancel();
    });

    if let Err(e) = server.await {
        tracing::error!(error = %e, "HTTP server failed");
        cancel.cancel();
    }

    // Drain
    let grace = Duration::from_secs(config.moderation.shutdown_grace_secs);
    workers.wait().await;
    pipeline.shutdown(grace).await;
    flush_producer(producer, grace).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Flush queued Kafka records off the async runtime; rdkafka's flush blocks
/// the calling thread for up to `grace`.
async fn flush_producer(producer: Arc<KafkaProducer>, grace: Duration) {
    match tokio::task::spawn_blocking(move || producer.flush(grace)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Kafka producer flush incomplete"),
        Err(e) => tracing::warn!(error = %e, "Kafka producer flush task failed"),
    }
}
