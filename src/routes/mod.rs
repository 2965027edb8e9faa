// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - messages.rs: Message create and history endpoints
// - media.rs: Signed attachment downloads
// - health.rs: Health check and metrics endpoints
// - extractors.rs: Custom Axum extractors (X-User-ID)
// - middleware.rs: Request logging
//
// ============================================================================

mod extractors;
mod health;
mod media;
mod messages;
mod middleware;

pub use extractors::{UserId, USER_ID_HEADER};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::MAX_REQUEST_BODY_SIZE;
use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // Messages
        .route("/api/messages", post(messages::create_message))
        .route("/api/messages/:group_id", get(messages::list_messages))
        // Attachments
        .route("/media/:object", get(media::download_media))
        // Multipart bodies carry the attachments
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Request logging
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .into_inner(),
        )
        .with_state(app_context)
}
