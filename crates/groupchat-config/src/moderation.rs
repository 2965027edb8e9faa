// ============================================================================
// Moderation Configuration
// ============================================================================

use crate::constants::*;

/// Verdict consumer and pending-reconciliation settings
#[derive(Clone, Debug)]
pub struct ModerationConfig {
    /// Bounded wait of a single verdict poll (milliseconds)
    pub poll_timeout_ms: u64,
    /// Re-send moderation requests for messages pending longer than this (seconds).
    /// 0 disables the reconciliation sweep.
    pub resend_after_secs: u64,
    /// How often the reconciliation sweep runs (seconds)
    pub sweep_interval_secs: u64,
    /// Maximum number of pending messages re-sent per sweep
    pub sweep_batch: i64,
    /// How long shutdown waits for in-flight background work (seconds)
    pub shutdown_grace_secs: u64,
}

impl ModerationConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            poll_timeout_ms: std::env::var("MODERATION_POLL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MODERATION_POLL_TIMEOUT_MS),
            resend_after_secs: std::env::var("MODERATION_RESEND_AFTER_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            sweep_interval_secs: std::env::var("MODERATION_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MODERATION_SWEEP_INTERVAL_SECS),
            sweep_batch: std::env::var("MODERATION_SWEEP_BATCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MODERATION_SWEEP_BATCH),
            shutdown_grace_secs: std::env::var("SHUTDOWN_GRACE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }

    /// Whether the pending reconciliation sweep should run
    pub fn sweep_enabled(&self) -> bool {
        self.resend_after_secs > 0
    }
}
