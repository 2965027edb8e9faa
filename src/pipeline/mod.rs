// ============================================================================
// Message Pipeline
// ============================================================================
//
// Orchestrates the life of a group message:
//
//   create  -> upload attachments -> persist (pending) -> newMessage broadcast
//           -> background: notification fan-out, moderation request
//   verdict -> idempotent status update -> hateUpdate broadcast (hate only)
//
// Background units run on a TaskTracker owned by the pipeline. They never
// block or fail the request that spawned them.
//
// ============================================================================

mod create;
pub mod error;
mod fanout;
mod query;
pub mod traits;
mod verdict;

pub use error::{ConsumerError, PipelineError};
pub use traits::{
    AttachmentStore, GroupDirectory, MessageStore, ModerationRequester, NotificationSender,
    RealtimeBroadcaster, VerdictSource,
};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::config::AttachmentFailurePolicy;
use crate::metrics;
use crate::realtime::RealtimeEvent;

/// Tunables of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub failure_policy: AttachmentFailurePolicy,
    /// Validity window of generated presentation URLs
    pub url_ttl: Duration,
    /// Log message content at debug level
    pub log_message_content: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            failure_policy: AttachmentFailurePolicy::BestEffort,
            url_ttl: Duration::from_secs(24 * 60 * 60),
            log_message_content: false,
        }
    }
}

/// Collaborators of the pipeline
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn MessageStore>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub directory: Arc<dyn GroupDirectory>,
    pub notifier: Arc<dyn NotificationSender>,
    pub moderation: Arc<dyn ModerationRequester>,
    pub broadcaster: Arc<dyn RealtimeBroadcaster>,
}

#[derive(Clone)]
pub struct MessagePipeline {
    deps: PipelineDeps,
    settings: PipelineSettings,
    tasks: TaskTracker,
}

impl MessagePipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            deps,
            settings: PipelineSettings::default(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Number of background units still running
    pub fn background_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every background unit spawned so far has finished.
    ///
    /// The tracker is reopened afterwards, so the pipeline stays usable.
    pub async fn wait_for_background(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Stop accepting background work and wait for in-flight units.
    ///
    /// Returns false when `grace` elapsed first.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tasks.close();
        match tokio::time::timeout(grace, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    remaining = self.tasks.len(),
                    grace_secs = grace.as_secs(),
                    "Background tasks still running after shutdown grace period"
                );
                false
            }
        }
    }

    /// Expiry for presentation URLs generated now
    fn url_expiry(&self) -> DateTime<Utc> {
        Utc::now()
            + chrono::Duration::from_std(self.settings.url_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(1))
    }

    /// Publish a realtime event; failures are logged and counted only
    async fn broadcast(&self, group_id: i64, event: &RealtimeEvent) {
        if let Err(e) = self.deps.broadcaster.publish(group_id, event).await {
            metrics::BROADCASTS_FAILED_TOTAL
                .with_label_values(&[event.kind()])
                .inc();
            warn!(
                error = %e,
                group_id = group_id,
                event = event.kind(),
                "Failed to publish realtime event"
            );
        }
    }
}
