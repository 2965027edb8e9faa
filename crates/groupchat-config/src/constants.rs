// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values
pub(crate) const DEFAULT_PORT: u16 = 8080;

// Attachments and presentation URLs
pub(crate) const DEFAULT_MEDIA_DATA_DIR: &str = "/data/media";
pub(crate) const DEFAULT_MEDIA_PUBLIC_BASE_URL: &str = "http://localhost:8080";
// 24 hours, matches the validity window clients were built against
pub(crate) const DEFAULT_MEDIA_URL_TTL_SECS: u64 = 24 * 60 * 60;
pub(crate) const MIN_SIGNING_SECRET_LEN: usize = 32;

// Moderation round-trip
pub(crate) const DEFAULT_MODERATION_POLL_TIMEOUT_MS: u64 = 5000;
pub(crate) const DEFAULT_MODERATION_SWEEP_INTERVAL_SECS: u64 = 60;
pub(crate) const DEFAULT_MODERATION_SWEEP_BATCH: i64 = 100;
pub(crate) const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

// Request size limits (in bytes)
// Attachments travel inside the multipart body of POST /api/messages, so the body
// limit must cover the largest file plus form overhead.
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024; // 64 KB of message text
pub const MAX_REQUEST_BODY_SIZE: usize = 32 * 1024 * 1024; // 32 MB per create request
