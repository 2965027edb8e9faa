// ============================================================================
// Moderation Worker
// ============================================================================
//
// Long-running consumer of moderation verdicts. One payload at a time:
// poll (bounded wait) -> decode -> MessagePipeline::apply_verdict -> commit.
//
// Nothing short of cancellation stops the loop: timeouts are routine,
// malformed payloads are skipped and transport errors back off briefly.
// A verdict whose status update failed is retried in place, so the offset
// never moves past it.
//
// ============================================================================

mod processor;
mod sweeper;

pub use processor::{process_payload, ProcessOutcome};
pub use sweeper::PendingSweeper;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::pipeline::{ConsumerError, MessagePipeline, VerdictSource};

const ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct ModerationWorker {
    source: Arc<dyn VerdictSource>,
    pipeline: MessagePipeline,
    poll_timeout: Duration,
    error_backoff: Duration,
}

impl ModerationWorker {
    pub fn new(
        source: Arc<dyn VerdictSource>,
        pipeline: MessagePipeline,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            source,
            pipeline,
            poll_timeout,
            error_backoff: ERROR_BACKOFF,
        }
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Consume verdicts until `cancel` fires. Returns the number of payloads handled.
    pub async fn run(self, cancel: CancellationToken) -> u64 {
        info!(
            poll_timeout_ms = self.poll_timeout.as_millis() as u64,
            "Moderation worker started"
        );
        let mut handled = 0u64;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.source.poll(self.poll_timeout) => polled,
            };

            let payload = match polled {
                Ok(Some(payload)) => payload,
                Ok(None) | Err(ConsumerError::Timeout) => continue,
                Err(ConsumerError::Transport(e)) => {
                    metrics::CONSUMER_ERRORS_TOTAL
                        .with_label_values(&["transport"])
                        .inc();
                    warn!(error = %e, "Verdict consumer transport error");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                    continue;
                }
            };

            // a verdict that was read is always finished before cancellation is observed,
            // unless its status update keeps failing
            let Some(outcome) = self.process_until_stored(&payload, &cancel).await else {
                break;
            };
            handled += 1;
            debug!(outcome = ?outcome, "Verdict payload handled");

            if let Err(e) = self.source.commit() {
                warn!(error = %e, "Failed to commit verdict offset");
            }
        }

        info!(handled = handled, "Moderation worker stopped");
        handled
    }

    /// Process one payload, retrying while the status update fails.
    ///
    /// Returns None when cancelled before the verdict could be stored; the
    /// payload stays uncommitted and is redelivered.
    async fn process_until_stored(
        &self,
        payload: &[u8],
        cancel: &CancellationToken,
    ) -> Option<ProcessOutcome> {
        let mut attempt = 1u32;
        loop {
            let outcome = process_payload(&self.pipeline, payload).await;
            if outcome.should_commit() {
                return Some(outcome);
            }

            warn!(
                attempt = attempt,
                backoff_ms = self.error_backoff.as_millis() as u64,
                "Verdict not stored, retrying"
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("Cancelled with an unstored verdict; it will be redelivered");
                    return None;
                }
                _ = tokio::time::sleep(self.error_backoff) => {}
            }
            attempt += 1;
        }
    }
}
