use chrono::Utc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::pipeline::MessagePipeline;

/// Periodically re-sends moderation requests for messages stuck in `pending`
///
/// Covers requests lost between persist and Kafka. Re-sending is harmless:
/// only the first verdict for a message is applied.
pub struct PendingSweeper {
    pipeline: MessagePipeline,
    resend_after: Duration,
    interval: Duration,
    batch: i64,
}

impl PendingSweeper {
    pub fn new(
        pipeline: MessagePipeline,
        resend_after: Duration,
        interval: Duration,
        batch: i64,
    ) -> Self {
        Self {
            pipeline,
            resend_after,
            interval,
            batch,
        }
    }

    /// One sweep: re-send requests for messages pending longer than `resend_after`
    pub async fn sweep_once(&self) -> usize {
        let threshold = chrono::Duration::from_std(self.resend_after)
            .unwrap_or_else(|_| chrono::Duration::zero());
        let older_than = Utc::now() - threshold;

        match self
            .pipeline
            .resend_stale_pending(older_than, self.batch)
            .await
        {
            Ok(resent) => resent,
            Err(e) => {
                tracing::error!(error = ?e, "Pending sweep failed");
                0
            }
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            resend_after_secs = self.resend_after.as_secs(),
            batch = self.batch,
            "Starting pending moderation sweep"
        );

        let mut interval = time::interval(self.interval);
        // first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            self.sweep_once().await;
        }

        tracing::info!("Pending moderation sweep stopped");
    }
}
