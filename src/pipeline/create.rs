use futures_util::future::join_all;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::{MessagePipeline, PipelineError};
use crate::config::{AttachmentFailurePolicy, MAX_CONTENT_LENGTH};
use crate::kafka::types::ModerationRequest;
use crate::message::{CreateMessage, Message, NewAttachment, NewMessage, RawAttachment};
use crate::metrics;
use crate::realtime::RealtimeEvent;
use crate::utils::generate_object_name;

fn validate(input: &CreateMessage) -> Result<(), PipelineError> {
    if input.user_id <= 0 {
        return Err(PipelineError::validation("user_id must be a positive integer"));
    }
    if input.group_id <= 0 {
        return Err(PipelineError::validation("group_id must be a positive integer"));
    }
    if input.content.trim().is_empty() && input.attachments.is_empty() {
        return Err(PipelineError::validation(
            "message must have content or at least one attachment",
        ));
    }
    if input.content.len() > MAX_CONTENT_LENGTH {
        return Err(PipelineError::validation(format!(
            "content exceeds {} bytes",
            MAX_CONTENT_LENGTH
        )));
    }
    Ok(())
}

impl MessagePipeline {
    /// Create a message and kick off its fan-out and moderation.
    ///
    /// On error nothing was persisted and nothing was broadcast.
    pub async fn create(&self, input: CreateMessage) -> Result<Message, PipelineError> {
        let start = Instant::now();
        if let Err(e) = validate(&input) {
            metrics::MESSAGES_REJECTED_TOTAL
                .with_label_values(&["validation"])
                .inc();
            return Err(e);
        }

        let CreateMessage {
            user_id,
            group_id,
            content,
            attachments,
        } = input;

        let had_attachments = !attachments.is_empty();
        let uploaded = self.upload_attachments(attachments).await.map_err(|e| {
            metrics::MESSAGES_REJECTED_TOTAL
                .with_label_values(&["attachment"])
                .inc();
            e
        })?;

        // Every attachment was dropped and there is no text left to send
        if had_attachments && uploaded.is_empty() && content.trim().is_empty() {
            metrics::MESSAGES_REJECTED_TOTAL
                .with_label_values(&["attachment"])
                .inc();
            return Err(PipelineError::AttachmentUpload {
                filename: String::new(),
                source: anyhow::anyhow!("no attachment could be uploaded"),
            });
        }

        let message = self
            .deps
            .store
            .create(NewMessage {
                user_id,
                group_id,
                content,
                attachments: uploaded,
            })
            .await
            .map_err(|e| {
                metrics::MESSAGES_REJECTED_TOTAL
                    .with_label_values(&["persistence"])
                    .inc();
                error!(
                    error = ?e,
                    user_id = user_id,
                    group_id = group_id,
                    "Failed to persist message"
                );
                PipelineError::Persistence(e)
            })?;

        metrics::MESSAGES_CREATED_TOTAL.inc();
        info!(
            message_id = message.id,
            user_id = message.user_id,
            group_id = message.group_id,
            files = message.files.len(),
            "Message created"
        );
        if self.settings.log_message_content {
            debug!(message_id = message.id, content = %message.content, "Message content");
        }

        self.broadcast(message.group_id, &RealtimeEvent::NewMessage(message.clone()))
            .await;

        self.spawn_fanout(&message);
        self.spawn_moderation_request(&message);

        metrics::CREATE_DURATION.observe(start.elapsed().as_secs_f64());
        Ok(message)
    }

    /// Upload all attachments concurrently, keeping the client's order
    async fn upload_attachments(
        &self,
        attachments: Vec<RawAttachment>,
    ) -> Result<Vec<NewAttachment>, PipelineError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(attachments.into_iter().map(|raw| self.upload_one(raw))).await;

        let mut uploaded = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(attachment) => uploaded.push(attachment),
                Err((filename, e)) => {
                    metrics::ATTACHMENT_UPLOAD_FAILURES_TOTAL.inc();
                    match self.settings.failure_policy {
                        AttachmentFailurePolicy::AllOrNothing => {
                            warn!(error = %e, filename = %filename, "Attachment upload failed, rejecting message");
                            return Err(PipelineError::AttachmentUpload {
                                filename,
                                source: e,
                            });
                        }
                        AttachmentFailurePolicy::BestEffort => {
                            warn!(error = %e, filename = %filename, "Attachment upload failed, dropping attachment");
                        }
                    }
                }
            }
        }
        Ok(uploaded)
    }

    async fn upload_one(
        &self,
        raw: RawAttachment,
    ) -> Result<NewAttachment, (String, anyhow::Error)> {
        let object_name = generate_object_name(&raw.filename);
        let size = raw.data.len() as i64;
        let RawAttachment {
            filename,
            content_type,
            data,
        } = raw;

        if let Err(e) = self
            .deps
            .attachments
            .upload(&object_name, &content_type, data)
            .await
        {
            return Err((filename, e));
        }

        let url = self
            .deps
            .attachments
            .presigned_url(&object_name, self.url_expiry());

        Ok(NewAttachment {
            object_name,
            original_name: filename,
            content_type,
            size,
            url,
        })
    }

    fn spawn_moderation_request(&self, message: &Message) {
        let moderation = self.deps.moderation.clone();
        let request = ModerationRequest {
            id: message.id,
            group_id: message.group_id,
            content: message.content.clone(),
        };

        self.tasks.spawn(async move {
            send_moderation_request(moderation.as_ref(), &request).await;
        });
    }
}

/// Hand one request to the classifier; failures are logged and counted only
pub(super) async fn send_moderation_request(
    moderation: &dyn super::ModerationRequester,
    request: &ModerationRequest,
) -> bool {
    match moderation.request(request).await {
        Ok(()) => {
            metrics::MODERATION_REQUESTS_SENT_TOTAL.inc();
            debug!(message_id = request.id, "Moderation request sent");
            true
        }
        Err(e) => {
            metrics::MODERATION_REQUESTS_FAILED_TOTAL.inc();
            warn!(
                error = %e,
                message_id = request.id,
                group_id = request.group_id,
                "Failed to send moderation request"
            );
            false
        }
    }
}
