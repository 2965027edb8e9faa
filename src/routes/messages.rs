// ============================================================================
// Message Routes
// ============================================================================
//
// Endpoints:
// - POST /api/messages - Create a group message (multipart, optional files)
// - GET /api/messages/:group_id - Group history, oldest first
//
// ============================================================================

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    Json,
};
use std::sync::Arc;

use super::extractors::UserId;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::message::{CreateMessage, Message, RawAttachment};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn parse_group_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation("group_id must be a positive integer"))
}

/// POST /api/messages
///
/// Multipart fields: `group_id`, `content`, and any number of `files[]` (or `files`) parts.
pub async fn create_message(
    State(app_context): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Message>> {
    let mut multipart =
        multipart.map_err(|e| AppError::validation(format!("expected multipart body: {}", e)))?;

    let mut group_id = None;
    let mut content = String::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "group_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("invalid group_id field: {}", e)))?;
                group_id = Some(parse_group_id(&text)?);
            }
            "content" => {
                content = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("invalid content field: {}", e)))?;
            }
            "files[]" | "files" => {
                let filename = field.file_name().unwrap_or("file").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::validation(format!("failed to read file '{}': {}", filename, e))
                })?;
                attachments.push(RawAttachment {
                    filename,
                    content_type,
                    data,
                });
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let group_id = group_id.ok_or_else(|| AppError::validation("group_id is required"))?;

    let message = app_context
        .pipeline
        .create(CreateMessage {
            user_id,
            group_id,
            content,
            attachments,
        })
        .await?;

    Ok(Json(message))
}

/// GET /api/messages/:group_id
pub async fn list_messages(
    State(app_context): State<Arc<AppContext>>,
    Path(group_id): Path<String>,
) -> AppResult<Json<Vec<Message>>> {
    let group_id = parse_group_id(&group_id)?;
    let messages = app_context.pipeline.list_by_group(group_id).await?;
    Ok(Json(messages))
}
