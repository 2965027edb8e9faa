// ============================================================================
// Redis (realtime broadcast) Configuration
// ============================================================================

/// Realtime broadcast settings
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Redis URL used for PUBLISH (redis:// or rediss://)
    pub url: String,
    /// Prefix for group channels: "{prefix}{group_id}"
    pub group_channel_prefix: String,
    /// Connection timeout on startup (seconds)
    pub connect_timeout_secs: u64,
}

impl RedisConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            url: std::env::var("REDIS_URL")
                .map_err(|_| anyhow::anyhow!("REDIS_URL must be set"))?,
            group_channel_prefix: std::env::var("REALTIME_GROUP_CHANNEL_PREFIX")
                .unwrap_or_else(|_| "group:".to_string()),
            connect_timeout_secs: std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}
