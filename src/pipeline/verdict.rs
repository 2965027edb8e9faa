use tracing::{debug, info, warn};

use super::{MessagePipeline, PipelineError};
use crate::kafka::types::ModerationVerdict;
use crate::message::{MessageStatus, Transition};
use crate::metrics;
use crate::realtime::RealtimeEvent;

impl MessagePipeline {
    /// Apply a moderation verdict to its message.
    ///
    /// Only the first verdict for a message takes effect. A `hateUpdate` is
    /// broadcast to the message's stored group exactly when this call moved
    /// the message into `hate`.
    pub async fn apply_verdict(
        &self,
        verdict: &ModerationVerdict,
    ) -> Result<Transition, PipelineError> {
        let requested = MessageStatus::from_verdict(verdict.is_hate_speech);
        let stored_group = self
            .deps
            .store
            .update_status(verdict.id, requested)
            .await
            .map_err(PipelineError::Persistence)?;

        let Some(group_id) = stored_group else {
            metrics::VERDICTS_APPLIED_TOTAL
                .with_label_values(&["ignored"])
                .inc();
            debug!(
                message_id = verdict.id,
                requested = %requested,
                "Verdict ignored, message unknown or already classified"
            );
            return Ok(Transition::Unchanged);
        };

        // the store only moves messages out of `pending`
        let transition = MessageStatus::Pending.apply_verdict(verdict.is_hate_speech);
        metrics::VERDICTS_APPLIED_TOTAL
            .with_label_values(&[requested.as_str()])
            .inc();
        info!(
            message_id = verdict.id,
            group_id = group_id,
            status = %requested,
            "Message status updated"
        );

        if transition.entered_hate() {
            if group_id != verdict.group_id {
                warn!(
                    message_id = verdict.id,
                    group_id = group_id,
                    verdict_group_id = verdict.group_id,
                    "Verdict names a different group than the stored message"
                );
            }
            self.broadcast(
                group_id,
                &RealtimeEvent::HateUpdate {
                    message_id: verdict.id,
                },
            )
            .await;
        }

        Ok(transition)
    }
}
