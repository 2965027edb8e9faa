// ============================================================================
// Media Routes
// ============================================================================
//
// Endpoints:
// - GET /media/:object?expires=..&signature=.. - Download an attachment
//
// Links are produced by the attachment store and stop working after their
// expiry. No per-user authorization: possession of a valid link is enough.
//
// ============================================================================

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::{AppError, AppResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct SignedLink {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// GET /media/:object
pub async fn download_media(
    State(app_context): State<Arc<AppContext>>,
    Path(object_name): Path<String>,
    Query(link): Query<SignedLink>,
) -> AppResult<Response> {
    let (Some(expires), Some(signature)) = (link.expires, link.signature) else {
        return Err(AppError::Forbidden("missing link signature".to_string()));
    };

    app_context
        .media
        .signer()
        .verify(&object_name, expires, &signature, Utc::now())?;

    let attachment = app_context
        .pipeline
        .find_attachment(&object_name)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, object = %object_name, "Attachment lookup failed");
            AppError::Unavailable("attachment lookup failed".to_string())
        })?;
    let content_type = attachment
        .as_ref()
        .map(|a| a.content_type.clone())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let data = app_context.media.read(&object_name).await?;

    let cache_max_age = (expires - Utc::now().timestamp()).max(0);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CACHE_CONTROL,
            format!("private, max-age={}", cache_max_age),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::internal(format!("failed to build media response: {}", e)))
}
