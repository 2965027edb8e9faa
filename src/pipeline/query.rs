use chrono::{DateTime, Utc};
use tracing::info;

use super::create::send_moderation_request;
use super::{MessagePipeline, PipelineError};
use crate::kafka::types::ModerationRequest;
use crate::message::{Attachment, Message};
use crate::metrics;

impl MessagePipeline {
    /// Messages of a group, oldest first, with freshly signed attachment URLs
    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<Message>, PipelineError> {
        if group_id <= 0 {
            return Err(PipelineError::validation("group_id must be a positive integer"));
        }

        let mut messages = self
            .deps
            .store
            .list_by_group(group_id)
            .await
            .map_err(PipelineError::Persistence)?;

        let expires_at = self.url_expiry();
        for file in messages.iter_mut().flat_map(|m| m.files.iter_mut()) {
            file.url = self
                .deps
                .attachments
                .presigned_url(&file.object_name, expires_at);
        }
        Ok(messages)
    }

    /// Attachment metadata for a stored object
    pub async fn find_attachment(
        &self,
        object_name: &str,
    ) -> Result<Option<Attachment>, PipelineError> {
        self.deps
            .store
            .find_attachment(object_name)
            .await
            .map_err(PipelineError::Persistence)
    }

    /// Re-send moderation requests for messages still pending since before `older_than`.
    ///
    /// Returns how many requests were handed to the classifier.
    pub async fn resend_stale_pending(
        &self,
        older_than: DateTime<Utc>,
        limit: i64,
    ) -> Result<usize, PipelineError> {
        let stale = self
            .deps
            .store
            .list_stale_pending(older_than, limit)
            .await
            .map_err(PipelineError::Persistence)?;

        let mut resent = 0;
        for message in &stale {
            let request = ModerationRequest {
                id: message.id,
                group_id: message.group_id,
                content: message.content.clone(),
            };
            if send_moderation_request(self.deps.moderation.as_ref(), &request).await {
                metrics::MODERATION_REQUESTS_RESENT_TOTAL.inc();
                resent += 1;
            }
        }

        if !stale.is_empty() {
            info!(
                stale = stale.len(),
                resent = resent,
                "Re-sent moderation requests for pending messages"
            );
        }
        Ok(resent)
    }
}
