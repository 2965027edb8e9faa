use tracing::{error, warn};

use crate::kafka::types::ModerationVerdict;
use crate::message::Transition;
use crate::metrics;
use crate::pipeline::MessagePipeline;

/// What happened to one verdict payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Applied(Transition),
    /// Payload could not be decoded; skipped for good
    Malformed,
    /// Status update failed; the payload must be retried before moving on
    PersistenceFailed,
}

impl ProcessOutcome {
    /// Whether the offset may be committed past this payload
    pub fn should_commit(self) -> bool {
        !matches!(self, ProcessOutcome::PersistenceFailed)
    }
}

/// Decode a raw verdict and apply it through the pipeline
pub async fn process_payload(pipeline: &MessagePipeline, payload: &[u8]) -> ProcessOutcome {
    let verdict = match ModerationVerdict::decode(payload) {
        Ok(verdict) => verdict,
        Err(reason) => {
            metrics::CONSUMER_ERRORS_TOTAL
                .with_label_values(&["malformed"])
                .inc();
            warn!(
                reason = %reason,
                payload_len = payload.len(),
                "Skipping malformed verdict payload"
            );
            return ProcessOutcome::Malformed;
        }
    };

    match pipeline.apply_verdict(&verdict).await {
        Ok(transition) => ProcessOutcome::Applied(transition),
        Err(e) => {
            metrics::CONSUMER_ERRORS_TOTAL
                .with_label_values(&["persistence"])
                .inc();
            error!(
                error = ?e,
                message_id = verdict.id,
                group_id = verdict.group_id,
                "Failed to apply verdict"
            );
            ProcessOutcome::PersistenceFailed
        }
    }
}
